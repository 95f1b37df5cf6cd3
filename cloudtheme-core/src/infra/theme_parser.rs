use cloudtheme_contracts::theme::ThemeParser;
use cloudtheme_model::ThemeObject;
use tracing::debug;

/// Parses theme files stored as JSON documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonThemeParser;

impl ThemeParser for JsonThemeParser {
    fn parse(&self, data: &[u8]) -> Option<ThemeObject> {
        match serde_json::from_slice::<ThemeObject>(data) {
            Ok(theme) => Some(theme),
            Err(err) => {
                debug!(target: "theme::parser", error = %err, bytes = data.len(), "theme data did not parse");
                None
            }
        }
    }
}
