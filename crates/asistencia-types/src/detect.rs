use serde::{Deserialize, Serialize};

/// Pixel coordinate in frame space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Ordered corners of a located code, top-left first.
pub type Quad = [Point; 4];

/// Result of running the code detector over one frame.
///
/// A code that was located but could not be decoded carries a region and no
/// payload; both fields are `None` when nothing was found.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecodeResult {
    pub payload: Option<String>,
    pub region: Option<Quad>,
}

impl DecodeResult {
    /// The decoded payload, if present and non-empty. An empty string never
    /// qualifies for reporting.
    pub fn reportable_payload(&self) -> Option<&str> {
        self.payload.as_deref().filter(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_is_not_reportable() {
        let result = DecodeResult {
            payload: Some(String::new()),
            region: Some([Point::new(0, 0); 4]),
        };
        assert!(result.reportable_payload().is_none());

        let decoded = DecodeResult {
            payload: Some("EMP-001".into()),
            region: None,
        };
        assert_eq!(decoded.reportable_payload(), Some("EMP-001"));
        assert!(DecodeResult::default().reportable_payload().is_none());
    }
}
