use thiserror::Error;

/// Optional capability that a backend or the hardware may not provide.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Feature {
    ZBuffering,
    VsyncControl,
    DisplayMode,
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Feature::ZBuffering => "z-buffering",
            Feature::VsyncControl => "vsync control",
            Feature::DisplayMode => "display mode",
        };
        f.write_str(s)
    }
}

/// Error taxonomy shared by every backend.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Error)]
pub enum ErrorKind {
    #[error("{0} is not supported")]
    UnsupportedFeature(Feature),
    #[error("out of video memory")]
    OutOfVideoMemory,
    #[error("native API call failed")]
    NativeApiCallFailed,
    #[error("too many errors")]
    TooManyErrors,
}

impl ErrorKind {
    /// Stable numeric code. `0` is reserved for "no error" and never returned.
    pub fn code(self) -> u32 {
        match self {
            ErrorKind::TooManyErrors => 1,
            ErrorKind::UnsupportedFeature(Feature::ZBuffering) => 2,
            ErrorKind::UnsupportedFeature(Feature::VsyncControl) => 3,
            ErrorKind::UnsupportedFeature(Feature::DisplayMode) => 4,
            ErrorKind::OutOfVideoMemory => 5,
            ErrorKind::NativeApiCallFailed => 6,
        }
    }
}

/// A single reported error.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("{kind} ({})", .context.as_deref().unwrap_or("no context"))]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub context: Option<String>,
}

impl ErrorRecord {
    pub fn new(kind: ErrorKind, context: impl Into<String>) -> Self {
        Self {
            kind,
            context: Some(context.into()),
        }
    }

    pub fn bare(kind: ErrorKind) -> Self {
        Self { kind, context: None }
    }

    /// Shorthand for the most common backend failure.
    pub fn api_call(context: impl Into<String>) -> Self {
        Self::new(ErrorKind::NativeApiCallFailed, context)
    }

    pub fn unsupported(feature: Feature, context: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedFeature(feature), context)
    }

    /// Flattens an `anyhow` chain into a record of the given kind.
    pub fn from_anyhow(kind: ErrorKind, err: &anyhow::Error) -> Self {
        Self::new(kind, format!("{err:#}"))
    }
}

/// Result type returned by backend entry points.
pub type RenderResult<T> = Result<T, ErrorRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct_and_nonzero() {
        let kinds = [
            ErrorKind::TooManyErrors,
            ErrorKind::UnsupportedFeature(Feature::ZBuffering),
            ErrorKind::UnsupportedFeature(Feature::VsyncControl),
            ErrorKind::UnsupportedFeature(Feature::DisplayMode),
            ErrorKind::OutOfVideoMemory,
            ErrorKind::NativeApiCallFailed,
        ];
        let mut codes: Vec<u32> = kinds.iter().map(|k| k.code()).collect();
        assert!(codes.iter().all(|&c| c != 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn record_display_includes_context() {
        let rec = ErrorRecord::unsupported(Feature::VsyncControl, "swap interval extension missing");
        assert_eq!(
            rec.to_string(),
            "vsync control is not supported (swap interval extension missing)"
        );
        assert_eq!(ErrorRecord::bare(ErrorKind::OutOfVideoMemory).to_string(), "out of video memory (no context)");
    }

    #[test]
    fn from_anyhow_keeps_the_chain() {
        let err = anyhow::anyhow!("device lost").context("failed to create wgpu device/queue");
        let rec = ErrorRecord::from_anyhow(ErrorKind::NativeApiCallFailed, &err);
        assert_eq!(
            rec.context.as_deref(),
            Some("failed to create wgpu device/queue: device lost")
        );
    }
}
