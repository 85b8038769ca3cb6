use thiserror::Error;

/// 尋找/取代核心回報的錯誤
///
/// 空的搜尋、沒有匹配、在空結果上移動都不算錯誤，會透過回傳的結果表達。
#[derive(Debug, Error)]
pub enum Error {
    /// 無法開啟交易，例如同一文檔上還有其他交易存在
    #[error("document transaction unavailable: {0}")]
    Transaction(String),

    /// 先前記錄的匹配已無法解析成文檔中的位置
    #[error("occurrence range is no longer valid")]
    StaleRange,

    #[error("invalid document markup: {0}")]
    Markup(String),

    #[error("unknown keystroke: {0}")]
    UnknownKeystroke(String),
}

pub type Result<T> = std::result::Result<T, Error>;
