//! Platforms and SDKs understood by the build orchestrator.

use std::fmt;

use crate::core::{CartelError, Result};

/// A deployment platform. Mobile platforms build for a device SDK and a
/// simulator SDK; the desktop platform builds once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Platform {
    /// macOS desktop.
    MacOS,
    /// iPhone and iPad.
    Ios,
    /// Apple TV.
    TvOs,
    /// Apple Watch.
    WatchOs,
}

/// One SDK passed to the build tool with `-sdk`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sdk {
    MacOsx,
    IPhoneOs,
    IPhoneSimulator,
    AppleTvOs,
    AppleTvSimulator,
    WatchOs,
    WatchSimulator,
}

impl Platform {
    /// Map a `PLATFORM_NAME` build setting to a platform.
    pub fn from_platform_name(name: &str) -> Result<Self> {
        match name {
            "macosx" => Ok(Self::MacOS),
            "iphoneos" | "iphonesimulator" => Ok(Self::Ios),
            "appletvos" | "appletvsimulator" => Ok(Self::TvOs),
            "watchos" | "watchsimulator" => Ok(Self::WatchOs),
            other => Err(CartelError::ParseError {
                description: format!("unknown platform name '{other}'"),
            }),
        }
    }

    /// Parse a `--platform` command-line value.
    pub fn from_flag(flag: &str) -> Result<Self> {
        match flag.to_ascii_lowercase().as_str() {
            "mac" | "macos" | "osx" => Ok(Self::MacOS),
            "ios" => Ok(Self::Ios),
            "tvos" => Ok(Self::TvOs),
            "watchos" => Ok(Self::WatchOs),
            other => Err(CartelError::InvalidArgument {
                description: format!(
                    "unknown platform '{other}' (expected macOS, iOS, tvOS, or watchOS)"
                ),
            }),
        }
    }

    /// The folder name under the build output tree.
    #[must_use]
    pub const fn folder_name(self) -> &'static str {
        match self {
            Self::MacOS => "Mac",
            Self::Ios => "iOS",
            Self::TvOs => "tvOS",
            Self::WatchOs => "watchOS",
        }
    }

    /// The SDKs to build, device first.
    #[must_use]
    pub const fn sdks(self) -> &'static [Sdk] {
        match self {
            Self::MacOS => &[Sdk::MacOsx],
            Self::Ios => &[Sdk::IPhoneOs, Sdk::IPhoneSimulator],
            Self::TvOs => &[Sdk::AppleTvOs, Sdk::AppleTvSimulator],
            Self::WatchOs => &[Sdk::WatchOs, Sdk::WatchSimulator],
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacOS => write!(f, "macOS"),
            Self::Ios => write!(f, "iOS"),
            Self::TvOs => write!(f, "tvOS"),
            Self::WatchOs => write!(f, "watchOS"),
        }
    }
}

impl Sdk {
    /// The `-sdk` argument value.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MacOsx => "macosx",
            Self::IPhoneOs => "iphoneos",
            Self::IPhoneSimulator => "iphonesimulator",
            Self::AppleTvOs => "appletvos",
            Self::AppleTvSimulator => "appletvsimulator",
            Self::WatchOs => "watchos",
            Self::WatchSimulator => "watchsimulator",
        }
    }

    /// Whether this SDK targets a simulator.
    #[must_use]
    pub const fn is_simulator(self) -> bool {
        matches!(
            self,
            Self::IPhoneSimulator | Self::AppleTvSimulator | Self::WatchSimulator
        )
    }

    /// The platform this SDK belongs to.
    #[must_use]
    pub const fn platform(self) -> Platform {
        match self {
            Self::MacOsx => Platform::MacOS,
            Self::IPhoneOs | Self::IPhoneSimulator => Platform::Ios,
            Self::AppleTvOs | Self::AppleTvSimulator => Platform::TvOs,
            Self::WatchOs | Self::WatchSimulator => Platform::WatchOs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_names_round_trip_through_sdks() {
        for platform in [Platform::MacOS, Platform::Ios, Platform::TvOs, Platform::WatchOs] {
            for sdk in platform.sdks() {
                assert_eq!(sdk.platform(), platform);
                assert_eq!(
                    Platform::from_platform_name(sdk.name()).unwrap(),
                    platform
                );
            }
        }
    }

    #[test]
    fn mobile_platforms_build_device_then_simulator() {
        assert_eq!(Platform::Ios.sdks(), &[Sdk::IPhoneOs, Sdk::IPhoneSimulator]);
        assert!(!Platform::Ios.sdks()[0].is_simulator());
        assert!(Platform::Ios.sdks()[1].is_simulator());
        assert_eq!(Platform::MacOS.sdks().len(), 1);
    }

    #[test]
    fn flag_parsing_is_case_insensitive() {
        assert_eq!(Platform::from_flag("iOS").unwrap(), Platform::Ios);
        assert_eq!(Platform::from_flag("Mac").unwrap(), Platform::MacOS);
        assert!(Platform::from_flag("solaris").is_err());
    }
}
