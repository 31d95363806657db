//! Interpreter availability checking.

use std::fmt;
use std::path::PathBuf;
use std::process::Command;

/// Whether the configured interpreter can be found on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterpreterStatus {
    /// The interpreter was found.
    Available { program: String, path: PathBuf },

    /// The interpreter is not on `PATH`.
    Missing {
        program: String,
        install_hint: String,
    },
}

impl InterpreterStatus {
    /// Look up `program` on `PATH`.
    ///
    /// A program given as a path is checked directly.
    pub fn detect(program: &str) -> Self {
        let direct = PathBuf::from(program);
        if direct.components().count() > 1 {
            return if direct.is_file() {
                InterpreterStatus::Available {
                    program: program.to_string(),
                    path: direct,
                }
            } else {
                Self::missing(program)
            };
        }

        let found = Command::new("which")
            .arg(program)
            .output()
            .ok()
            .filter(|o| o.status.success())
            .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
            .filter(|p| !p.is_empty());

        match found {
            Some(path) => InterpreterStatus::Available {
                program: program.to_string(),
                path: PathBuf::from(path),
            },
            None => Self::missing(program),
        }
    }

    fn missing(program: &str) -> Self {
        let install_hint = format!(
            "Scripts are executed with '{program}'.\n\
             Install GNU Octave:\n\
             \n\
               Ubuntu/Debian: sudo apt-get install octave\n\
               Fedora:        sudo dnf install octave\n\
               Arch:          sudo pacman -S octave\n\
               macOS:         brew install octave\n\
             \n\
             Or point [sandbox].interpreter at an installed binary."
        );
        InterpreterStatus::Missing {
            program: program.to_string(),
            install_hint,
        }
    }

    /// Check if the interpreter is available.
    pub fn is_available(&self) -> bool {
        matches!(self, InterpreterStatus::Available { .. })
    }

    /// Get the install hint if the interpreter is missing.
    pub fn install_hint(&self) -> Option<&str> {
        match self {
            InterpreterStatus::Missing { install_hint, .. } => Some(install_hint),
            InterpreterStatus::Available { .. } => None,
        }
    }
}

impl fmt::Display for InterpreterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpreterStatus::Available { program, path } => {
                write!(f, "Interpreter '{program}' available at {}", path.display())
            }
            InterpreterStatus::Missing {
                program,
                install_hint,
            } => write!(f, "Interpreter '{program}' not found\n\n{install_hint}"),
        }
    }
}
