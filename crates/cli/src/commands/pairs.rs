//! Supported conversion pairs

use serde::Serialize;
use testbridge_core::{Converter, Framework};

use crate::output::{print_list, OutputFormat, TableDisplay};

#[derive(Debug, Serialize)]
pub struct PairDisplay {
    pub from: Framework,
    pub to: Framework,
}

impl TableDisplay for PairDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["From", "To"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.from.to_string(), self.to.to_string()]
    }
}

pub fn list() -> Vec<PairDisplay> {
    Converter::pairs()
        .into_iter()
        .map(|(from, to)| PairDisplay { from, to })
        .collect()
}

pub fn execute(format: OutputFormat) {
    print_list(&list(), format);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_six_rows() {
        let pairs = list();
        assert_eq!(pairs.len(), 6);
        assert_eq!(pairs[0].row(), vec!["cypress", "playwright"]);
        let json = serde_json::to_string(&pairs[0]).unwrap();
        assert_eq!(json, r#"{"from":"cypress","to":"playwright"}"#);
    }
}
