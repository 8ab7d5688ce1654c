use std::collections::HashSet;

use serde::{Deserialize, Serialize, de};
use serde_json::Value;

use crate::error::SuiteConfigurationError;
use crate::rules::eval::TestCase;

/// Ordered list of labeled test cases.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TestSuite {
    pub test_cases: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(test_cases: Vec<TestCase>) -> Self {
        Self { test_cases }
    }

    /// Parse `{"test_cases": [...]}`, a bare array, or a single case object.
    ///
    /// The shape is picked before any case is decoded, so a malformed case
    /// is reported with its position and id instead of a shape mismatch.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        let doc: Value = serde_json::from_str(s)?;
        let test_cases = match doc {
            Value::Object(mut map) => match map.remove("test_cases") {
                Some(Value::Array(items)) => parse_cases(items)?,
                Some(_) => return Err(de::Error::custom("`test_cases` must be an array")),
                None => vec![parse_case(0, Value::Object(map))?],
            },
            Value::Array(items) => parse_cases(items)?,
            _ => {
                return Err(de::Error::custom(
                    "expected a test case object, an array of cases, or {\"test_cases\": [...]}",
                ));
            }
        };
        Ok(Self { test_cases })
    }

    /// Case ids must be unique within a suite.
    pub fn check_unique_ids(&self) -> Result<(), SuiteConfigurationError> {
        let mut seen = HashSet::with_capacity(self.test_cases.len());
        for case in &self.test_cases {
            if !seen.insert(case.id.as_str()) {
                return Err(SuiteConfigurationError::DuplicateCaseId {
                    case_id: case.id.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.test_cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.test_cases.is_empty()
    }
}

fn parse_cases(items: Vec<Value>) -> serde_json::Result<Vec<TestCase>> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| parse_case(index, item))
        .collect()
}

fn parse_case(index: usize, value: Value) -> serde_json::Result<TestCase> {
    let id = value.get("id").and_then(Value::as_str).map(str::to_owned);
    TestCase::deserialize(value).map_err(|e| match id {
        Some(id) => de::Error::custom(format!("test case {index} (`{id}`): {e}")),
        None => de::Error::custom(format!("test case {index}: {e}")),
    })
}
