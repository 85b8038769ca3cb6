use serde::{Deserialize, Serialize};

/// y-prosemirror 綁定編輯器所用的根 XML fragment 名稱
pub const DEFAULT_FRAGMENT: &str = "content";

/// 捲動到匹配時與 viewport 邊緣保留的距離（像素）
pub const DEFAULT_VIEWPORT_OFFSET: u32 = 130;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FindReplaceConfig {
    /// 搜尋的根 fragment
    pub fragment: String,
    /// 每次捲動請求傳給 viewport 的偏移量
    pub viewport_offset: u32,
}

impl Default for FindReplaceConfig {
    fn default() -> Self {
        Self {
            fragment: DEFAULT_FRAGMENT.to_string(),
            viewport_offset: DEFAULT_VIEWPORT_OFFSET,
        }
    }
}
