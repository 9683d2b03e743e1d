//! Shared fixtures for host store tests

use std::collections::HashMap;
use std::net::IpAddr;
use std::rc::Rc;

use super::canonical::Resolve;
use super::store::ConfigStore;
use crate::report::RecordingReporter;

/// In-memory DNS table
#[derive(Debug, Default, Clone)]
pub struct StaticResolver {
    records: HashMap<String, IpAddr>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, hostname: &str, ip: &str) -> Self {
        self.records
            .insert(hostname.to_string(), ip.parse().unwrap());
        self
    }
}

impl Resolve for StaticResolver {
    fn lookup_a(&self, hostname: &str) -> Option<IpAddr> {
        self.records.get(hostname).copied()
    }
}

/// Store with no DNS entries and a recording reporter
pub fn store() -> (ConfigStore, Rc<RecordingReporter>) {
    store_with(StaticResolver::new())
}

pub fn store_with(resolver: StaticResolver) -> (ConfigStore, Rc<RecordingReporter>) {
    let reporter = Rc::new(RecordingReporter::new());
    let store = ConfigStore::new()
        .with_resolver(resolver)
        .with_reporter(reporter.clone());
    (store, reporter)
}
