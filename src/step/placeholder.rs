//! `${name}` placeholder resolution
//!
//! Substitution restarts from the beginning of the string after every
//! replacement, so values that themselves contain placeholders are expanded
//! too. There is no cycle detection: a variable whose value refers back to
//! itself never reaches a fixed point.

use crate::common::{Error, Result};
use crate::sink::LogSink;
use crate::vars::VariableResolver;

const OPEN: &str = "${";
const CLOSE: char = '}';

/// Substitute every `${name}` in `template` using `vars`
///
/// Each lookup is reported on `sink` before the scan continues or aborts.
pub fn resolve<R>(template: &str, vars: &R, sink: &dyn LogSink) -> Result<String>
where
    R: VariableResolver + ?Sized,
{
    let mut resolved = template.to_string();

    while let Some(start) = resolved.find(OPEN) {
        let end = resolved[start..]
            .find(CLOSE)
            .map(|pos| start + pos)
            .ok_or(Error::UnterminatedPlaceholder { offset: start })?;

        let name = &resolved[start + OPEN.len()..end];
        sink.info(&format!("Trying to resolve ${{{}}}", name));

        let Some(value) = vars.resolve(name) else {
            sink.error(&format!("${{{}}} not found", name));
            return Err(Error::UnresolvedVariable(name.to_string()));
        };
        sink.info(&format!("Resolved ${{{}}} as {}", name, value));
        tracing::debug!(name, value = %value, "Resolved placeholder");

        resolved.replace_range(start..=end, &value);
    }

    Ok(resolved)
}
