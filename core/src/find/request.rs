use serde::{Deserialize, Serialize};

use super::occurrences::OccurrenceInfo;
use super::session::SearchKey;

/// 對外接受的選項
///
/// 缺少的欄位使用預設值 `"", false, 1, "", false`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecuteOptions {
    pub find_text: String,
    pub match_case: bool,
    pub increment: i64,
    pub replace_text: String,
    pub replace_all: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            find_text: String::new(),
            match_case: false,
            increment: 1,
            replace_text: String::new(),
            replace_all: false,
        }
    }
}

impl ExecuteOptions {
    pub fn find(find_text: impl Into<String>, increment: i64) -> Self {
        Self {
            find_text: find_text.into(),
            increment,
            ..Self::default()
        }
    }

    pub fn match_case(mut self, match_case: bool) -> Self {
        self.match_case = match_case;
        self
    }

    pub fn replace_with(mut self, replace_text: impl Into<String>) -> Self {
        self.replace_text = replace_text.into();
        self
    }

    pub fn all(mut self) -> Self {
        self.replace_all = true;
        self
    }

    /// 決定選項要求的操作
    ///
    /// # Returns
    /// 尋找字詞為空時回傳 `None`；取代字詞為空時一律視為單純尋找
    pub fn into_request(self) -> Option<Request> {
        if self.find_text.is_empty() {
            return None;
        }
        let key = SearchKey {
            term: self.find_text,
            match_case: self.match_case,
        };

        let request = match (self.replace_text.is_empty(), self.replace_all) {
            (true, _) => Request::Find(FindRequest {
                key,
                increment: self.increment,
            }),
            (false, true) => Request::ReplaceAll(ReplaceAllRequest {
                key,
                replacement: self.replace_text,
            }),
            (false, false) => Request::ReplaceOne(ReplaceRequest {
                key,
                replacement: self.replace_text,
                increment: self.increment,
            }),
        };
        Some(request)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindRequest {
    pub key: SearchKey,
    pub increment: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceRequest {
    pub key: SearchKey,
    pub replacement: String,
    pub increment: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceAllRequest {
    pub key: SearchKey,
    pub replacement: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Find(FindRequest),
    ReplaceOne(ReplaceRequest),
    ReplaceAll(ReplaceAllRequest),
}

impl Request {
    pub fn key(&self) -> &SearchKey {
        match self {
            Request::Find(request) => &request.key,
            Request::ReplaceOne(request) => &request.key,
            Request::ReplaceAll(request) => &request.key,
        }
    }
}

/// 尋找或單次取代的結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindResult {
    pub current: Option<OccurrenceInfo>,
    pub occurrences: Vec<OccurrenceInfo>,
    pub current_index: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Found(FindResult),
    ReplacedAll { total: usize },
}

impl Outcome {
    pub fn total(&self) -> usize {
        match self {
            Outcome::Found(result) => result.total,
            Outcome::ReplacedAll { total } => *total,
        }
    }
}
