use std::fmt;

/// Detected operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Linux,
    MacOs,
    Windows,
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::MacOs => write!(f, "macos"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

/// Platform information for the current system.
#[derive(Debug, Clone, Copy)]
pub struct Platform {
    pub os: Os,
}

impl Platform {
    /// Detect the current platform.
    #[must_use]
    pub const fn detect() -> Self {
        Self {
            os: Self::detect_os(),
        }
    }

    /// Create a platform with an explicit OS (for tests and cross-resolution).
    #[must_use]
    pub const fn new(os: Os) -> Self {
        Self { os }
    }

    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }

    #[must_use]
    pub fn is_macos(&self) -> bool {
        self.os == Os::MacOs
    }

    const fn detect_os() -> Os {
        if cfg!(target_os = "windows") {
            Os::Windows
        } else if cfg!(target_os = "macos") {
            Os::MacOs
        } else {
            // Other Unix-like systems follow Linux conventions
            Os::Linux
        }
    }
}
