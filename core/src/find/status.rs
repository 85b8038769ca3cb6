//! 尋找與取代欄位旁顯示的計數文字

pub const NOT_FOUND: &str = "Not found";

/// 有匹配時為 `"{i+1} of {n}"`，否則為 `"Not found"`
pub fn find_info(current_index: usize, total: usize) -> String {
    if total > 0 {
        format!("{} of {}", current_index + 1, total)
    } else {
        NOT_FOUND.to_string()
    }
}

/// 全部取代後的摘要，沒有取代任何東西時回傳 `None`
pub fn replaced_info(total: usize) -> Option<String> {
    (total > 0).then(|| format!("Replaced {total} times"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_info() {
        assert_eq!(find_info(0, 3), "1 of 3");
        assert_eq!(find_info(2, 3), "3 of 3");
        assert_eq!(find_info(0, 0), "Not found");
    }

    #[test]
    fn test_replaced_info() {
        assert_eq!(replaced_info(4).as_deref(), Some("Replaced 4 times"));
        assert_eq!(replaced_info(0), None);
    }
}
