mod properties;

use std::sync::Arc;

use super::testutil::{test_conn, test_dict, toy_conn, toy_dict};
use super::Analyzer;

fn sumomo_analyzer() -> Analyzer {
    Analyzer::new(Arc::new(test_dict()), Arc::new(test_conn()))
}

fn toy_analyzer() -> Analyzer {
    Analyzer::new(Arc::new(toy_dict()), Arc::new(toy_conn()))
}
