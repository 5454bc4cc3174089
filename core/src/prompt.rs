use rentlens_protocol::listing::Property;

/// The chat message that asks the agent for a transparency report.
pub fn analysis_message(address: &str) -> String {
    format!("Generate a transparency report for the property at {}", address.trim())
}

/// The address to analyze for `property`: its street address, else its
/// building name. `None` when the listing carries neither.
pub fn analysis_address(property: &Property) -> Option<&str> {
    [Some(property.address.as_str()), property.building_name.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
}
