//! Keywords exposed by the NVDA spy

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::common::Error;

use super::xmlrpc::Value;

/// The keywords the spy library serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpyKeyword {
    /// Blocks on the spy side until NVDA reports startup is complete
    WaitForNvdaStartupToComplete,
    /// Aligns the spy's own keyword timeouts with the client's call bound
    SetMaxKeywordDuration,
    SetConfigValue,
    GetLastSpeechIndex,
    GetNextSpeechIndex,
    GetSpeechAtIndexUntilNow,
    WaitForSpecificSpeech,
    WaitForSpeechToFinish,
    EmulateKeyPress,
    DumpSpeechToLog,
}

impl SpyKeyword {
    pub const ALL: [SpyKeyword; 10] = [
        SpyKeyword::WaitForNvdaStartupToComplete,
        SpyKeyword::SetMaxKeywordDuration,
        SpyKeyword::SetConfigValue,
        SpyKeyword::GetLastSpeechIndex,
        SpyKeyword::GetNextSpeechIndex,
        SpyKeyword::GetSpeechAtIndexUntilNow,
        SpyKeyword::WaitForSpecificSpeech,
        SpyKeyword::WaitForSpeechToFinish,
        SpyKeyword::EmulateKeyPress,
        SpyKeyword::DumpSpeechToLog,
    ];

    /// Name on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            SpyKeyword::WaitForNvdaStartupToComplete => "wait_for_NVDA_startup_to_complete",
            SpyKeyword::SetMaxKeywordDuration => "set_max_keyword_duration",
            SpyKeyword::SetConfigValue => "set_configValue",
            SpyKeyword::GetLastSpeechIndex => "get_last_speech_index",
            SpyKeyword::GetNextSpeechIndex => "get_next_speech_index",
            SpyKeyword::GetSpeechAtIndexUntilNow => "get_speech_at_index_until_now",
            SpyKeyword::WaitForSpecificSpeech => "wait_for_specific_speech",
            SpyKeyword::WaitForSpeechToFinish => "wait_for_speech_to_finish",
            SpyKeyword::EmulateKeyPress => "emulateKeyPress",
            SpyKeyword::DumpSpeechToLog => "dump_speech_to_log",
        }
    }
}

impl fmt::Display for SpyKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpyKeyword {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpyKeyword::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = SpyKeyword::ALL.iter().map(|k| k.as_str()).collect();
                Error::Config(format!(
                    "Unknown nvdaSpy keyword '{}'. Known keywords: {}",
                    s,
                    known.join(", ")
                ))
            })
    }
}

/// A keyword invocation: name, positional and named arguments
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordCall {
    pub keyword: SpyKeyword,
    pub args: Vec<Value>,
    pub kwargs: BTreeMap<String, Value>,
}

impl KeywordCall {
    pub fn new(keyword: SpyKeyword) -> Self {
        Self {
            keyword,
            args: Vec::new(),
            kwargs: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn kwarg(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.to_string(), value.into());
        self
    }

    /// `wait_for_NVDA_startup_to_complete`, no arguments
    pub fn wait_for_nvda_startup_to_complete() -> Self {
        Self::new(SpyKeyword::WaitForNvdaStartupToComplete)
    }

    /// `set_max_keyword_duration(maxSeconds=<secs>)`
    pub fn set_max_keyword_duration(max_seconds: u64) -> Self {
        Self::new(SpyKeyword::SetMaxKeywordDuration).kwarg("maxSeconds", max_seconds as i64)
    }
}

impl fmt::Display for KeywordCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} args: {:?}, kwargs: {:?}",
            self.keyword, self.args, self.kwargs
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_from_str() {
        for keyword in SpyKeyword::ALL {
            assert_eq!(keyword.as_str().parse::<SpyKeyword>().unwrap(), keyword);
        }
    }

    #[test]
    fn test_unknown_keyword_lists_known_names() {
        let err = "wait_for_nothing".parse::<SpyKeyword>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("wait_for_nothing"));
        assert!(msg.contains("wait_for_NVDA_startup_to_complete"));
    }

    #[test]
    fn test_startup_calls() {
        let wait = KeywordCall::wait_for_nvda_startup_to_complete();
        assert_eq!(wait.keyword.as_str(), "wait_for_NVDA_startup_to_complete");
        assert!(wait.args.is_empty() && wait.kwargs.is_empty());

        let duration = KeywordCall::set_max_keyword_duration(30);
        assert!(duration.args.is_empty());
        assert_eq!(duration.kwargs.get("maxSeconds"), Some(&Value::Int(30)));
    }

    #[test]
    fn test_builder() {
        let call = KeywordCall::new(SpyKeyword::WaitForSpecificSpeech)
            .arg("Welcome")
            .kwarg("afterIndex", 3i64);
        assert_eq!(call.args, vec![Value::String("Welcome".to_string())]);
        assert_eq!(call.kwargs.get("afterIndex"), Some(&Value::Int(3)));
        assert!(call.to_string().starts_with("wait_for_specific_speech args: "));
    }
}
