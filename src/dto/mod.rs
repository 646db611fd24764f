use serde::Deserialize;

pub mod addons;
pub mod auth;
pub mod categories;
pub mod menu;
pub mod products;
pub mod uploads;

/// Strips surrounding whitespace so length rules see the stored value.
fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(String::deserialize(deserializer)?.trim().to_string())
}

fn trimmed_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(|s| s.trim().to_string()))
}
