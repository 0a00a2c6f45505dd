//! Probe execution
//!
//! A probe exercises the registry the way an intercepted call site would:
//! method descriptors are invoked with the probe's arguments and fallback,
//! type descriptors are handed to the synthesizer.

use crate::config::ProbeSettings;
use redirection_system::{
    parse_method_descriptor, parse_type_descriptor, Fallback, RedirectionError, RedirectionRegistry, Value,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of one probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeReport {
    pub descriptor: String,
    /// Rendered result, when the probe produced one
    pub result: Option<String>,
    pub error: Option<String>,
    /// Result of the follow-up proxy call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call: Option<Box<ProbeReport>>,
}

impl ProbeReport {
    fn new(descriptor: impl Into<String>, outcome: Result<Value, RedirectionError>) -> Self {
        let (result, error) = match outcome {
            Ok(value) => (Some(render(&value)), None),
            Err(error) => (None, Some(error.to_string())),
        };
        Self {
            descriptor: descriptor.into(),
            result,
            error,
            call: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.call.as_ref().map_or(true, |call| call.is_ok())
    }
}

/// Human-readable form of a probe result.
pub fn render(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Void => "void".to_string(),
        Value::Bool(v) => v.to_string(),
        Value::Byte(v) => v.to_string(),
        Value::Char(v) => char::from_u32(u32::from(*v)).map_or_else(|| format!("\\u{v:04x}"), String::from),
        Value::Short(v) => v.to_string(),
        Value::Int(v) => v.to_string(),
        Value::Long(v) => format!("{v}L"),
        Value::Float(v) => format!("{v}f"),
        Value::Double(v) => v.to_string(),
        Value::Str(s) => format!("{s:?}"),
        Value::Array(array) if array.is_empty() => format!("empty {}", array.array_type()),
        Value::Array(array) => format!("{} of length {}", array.array_type(), array.len()),
        Value::Object(instance) => format!("{} instance", instance.class().name()),
        Value::Proxy(proxy) => format!("proxy {} for {}", proxy.id(), proxy.interface().name()),
    }
}

/// Runs a single probe against `registry`.
pub fn run_probe(registry: &Arc<RedirectionRegistry>, probe: &ProbeSettings) -> ProbeReport {
    let args: Vec<Value> = probe.args.iter().map(|arg| arg.to_value()).collect();

    let outcome = if let Some(shape) = parse_method_descriptor(&probe.descriptor, registry.catalog()) {
        let fallback = match &probe.fallback {
            Some(value) => Fallback::value(value.to_value()),
            None => Fallback::unsupported(),
        };
        registry.invoke(&probe.descriptor, &shape.owner, None, fallback, &args)
    } else if let Some(ty) = parse_type_descriptor(&probe.descriptor, registry.catalog()) {
        Ok(registry
            .synthesize(&ty, &probe.descriptor)
            .into_value()
            .unwrap_or(Value::Null))
    } else {
        Err(RedirectionError::unsupported(probe.descriptor.as_str()))
    };

    let proxy = outcome.as_ref().ok().and_then(Value::as_proxy).cloned();
    let mut report = ProbeReport::new(probe.descriptor.as_str(), outcome);

    if let Some(method) = &probe.call {
        let call_args: Vec<Value> = probe.call_args.iter().map(|arg| arg.to_value()).collect();
        let call_report = match proxy {
            Some(proxy) => ProbeReport::new(format!("{} -> {method}", probe.descriptor), proxy.call(method, &call_args)),
            None => ProbeReport {
                descriptor: method.clone(),
                result: None,
                error: Some("probe result is not a proxy".to_string()),
                call: None,
            },
        };
        report.call = Some(Box::new(call_report));
    }

    report
}

/// Runs every probe in order, logging each outcome.
pub fn run_probes(registry: &Arc<RedirectionRegistry>, probes: &[ProbeSettings]) -> Vec<ProbeReport> {
    probes
        .iter()
        .map(|probe| {
            let report = run_probe(registry, probe);
            log_report(&report);
            report
        })
        .collect()
}

fn log_report(report: &ProbeReport) {
    match (&report.result, &report.error) {
        (Some(result), _) => info!(descriptor = %report.descriptor, "Probe returned {}", result),
        (None, Some(error)) => warn!(descriptor = %report.descriptor, "Probe failed: {}", error),
        (None, None) => {}
    }
    if let Some(call) = &report.call {
        log_report(call);
    }
}
