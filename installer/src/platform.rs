//! Operating system and architecture names as used by Go distributions.
//!
//! Go archives are named `go{version}.{os}-{arch}.tar.gz` using Go's own
//! `GOOS`/`GOARCH` vocabulary, which differs from Rust's
//! (`macos` is `darwin`, `x86_64` is `amd64`, and so on).

use crate::request::RequestError;
use std::fmt;
use std::str::FromStr;

/// A Go operating system name (`GOOS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoOs {
    /// `linux`
    Linux,
    /// `darwin` (macOS)
    Darwin,
    /// `windows`
    Windows,
    /// `freebsd`
    FreeBsd,
}

impl GoOs {
    const ALL: [Self; 4] = [Self::Linux, Self::Darwin, Self::Windows, Self::FreeBsd];

    /// Return the Go name of this operating system.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
            Self::Windows => "windows",
            Self::FreeBsd => "freebsd",
        }
    }

    /// Map the host operating system onto its Go name.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::UnsupportedOs`] when the host has no Go
    /// distribution.
    ///
    /// # Examples
    ///
    /// ```
    /// use godownload_installer::platform::GoOs;
    ///
    /// # #[cfg(target_os = "linux")]
    /// assert_eq!(GoOs::host().expect("linux is supported"), GoOs::Linux);
    /// ```
    pub fn host() -> Result<Self, RequestError> {
        match std::env::consts::OS {
            "macos" => Ok(Self::Darwin),
            other => other.parse(),
        }
    }

    fn supported() -> String {
        Self::ALL.map(Self::as_str).join(", ")
    }
}

impl FromStr for GoOs {
    type Err = RequestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|os| os.as_str() == value)
            .ok_or_else(|| RequestError::UnsupportedOs {
                value: value.to_owned(),
                expected: Self::supported(),
            })
    }
}

impl fmt::Display for GoOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Go architecture name (`GOARCH`), using the spelling of the
/// distribution archive names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoArch {
    /// `amd64`
    Amd64,
    /// `arm64`
    Arm64,
    /// `386`
    I386,
    /// `armv6l`, the only 32-bit ARM archive Go publishes.
    Armv6l,
    /// `ppc64le`
    Ppc64le,
    /// `s390x`
    S390x,
    /// `riscv64`
    Riscv64,
    /// `loong64`
    Loong64,
}

impl GoArch {
    const ALL: [Self; 8] = [
        Self::Amd64,
        Self::Arm64,
        Self::I386,
        Self::Armv6l,
        Self::Ppc64le,
        Self::S390x,
        Self::Riscv64,
        Self::Loong64,
    ];

    /// Return the archive name of this architecture.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
            Self::I386 => "386",
            Self::Armv6l => "armv6l",
            Self::Ppc64le => "ppc64le",
            Self::S390x => "s390x",
            Self::Riscv64 => "riscv64",
            Self::Loong64 => "loong64",
        }
    }

    /// Map the host architecture onto its Go archive name.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::UnsupportedArch`] when the host has no Go
    /// distribution.
    pub fn host() -> Result<Self, RequestError> {
        match std::env::consts::ARCH {
            "x86_64" => Ok(Self::Amd64),
            "aarch64" => Ok(Self::Arm64),
            "x86" => Ok(Self::I386),
            "arm" => Ok(Self::Armv6l),
            "powerpc64" => Ok(Self::Ppc64le),
            "loongarch64" => Ok(Self::Loong64),
            other => other.parse(),
        }
    }

    fn supported() -> String {
        Self::ALL.map(Self::as_str).join(", ")
    }
}

impl FromStr for GoArch {
    type Err = RequestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|arch| arch.as_str() == value)
            .ok_or_else(|| RequestError::UnsupportedArch {
                value: value.to_owned(),
                expected: Self::supported(),
            })
    }
}

impl fmt::Display for GoArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
