//! Reference types, methods, fields, and code locations.

use std::sync::Arc;

use crate::error::WireError;
use crate::value::WireValue;

// ── WireLocation ─────────────────────────────────────────────────────────────

/// A concrete code position inside a loaded class at which a breakpoint can
/// be installed or at which execution has stopped.
///
/// Equality and hashing cover the full tuple; resolvers deduplicate candidate
/// locations by `(source_path, source_name, line)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WireLocation {
    /// Fully qualified name of the declaring type.
    pub type_name: String,
    /// Name of the enclosing method (empty for class-level locations).
    pub method_name: String,
    /// Unqualified source file name, when the class was compiled with debug info.
    pub source_name: Option<String>,
    /// Compiler-recorded source path, when available.
    pub source_path: Option<String>,
    /// 1-based source line, when available.
    pub line: Option<u32>,
}

impl WireLocation {
    /// The dedup key used by location resolvers.
    pub fn source_key(&self) -> (Option<&str>, Option<&str>, Option<u32>) {
        (
            self.source_path.as_deref(),
            self.source_name.as_deref(),
            self.line,
        )
    }
}

impl std::fmt::Display for WireLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}({}:{})",
            self.type_name,
            self.method_name,
            self.source_name.as_deref().unwrap_or("<unknown>"),
            self.line.map_or_else(|| "?".to_string(), |l| l.to_string()),
        )
    }
}

// ── Field ────────────────────────────────────────────────────────────────────

/// A field declared by a reference type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field name.
    pub name: String,
    /// Declared type name.
    pub type_name: String,
    /// Whether the field is static (class-owned rather than instance-owned).
    pub is_static: bool,
}

// ── Method ───────────────────────────────────────────────────────────────────

/// A method of a loaded reference type.
pub trait Method: Send + Sync {
    /// Method name.
    fn name(&self) -> String;

    /// All line-table locations of this method.
    ///
    /// Returns [`WireError::AbsentInformation`] when the method carries no
    /// line table; callers are expected to tolerate that silently.
    fn line_locations(&self) -> Result<Vec<WireLocation>, WireError>;
}

// ── ReferenceType ────────────────────────────────────────────────────────────

/// A class loaded in the target machine.
pub trait ReferenceType: Send + Sync {
    /// Fully qualified type name (e.g. `pkg.Foo`).
    fn name(&self) -> String;

    /// Unqualified source file name recorded at compile time.
    fn source_name(&self) -> Result<String, WireError>;

    /// Declared fields, in declaration order. Does not include inherited
    /// fields; walk [`ReferenceType::superclass`] for those.
    fn fields(&self) -> Vec<Field>;

    /// Direct superclass, if any.
    fn superclass(&self) -> Option<Arc<dyn ReferenceType>>;

    /// Class-level line-table locations (static initializers and the like).
    fn line_locations(&self) -> Result<Vec<WireLocation>, WireError>;

    /// All methods declared by this type.
    fn methods(&self) -> Vec<Arc<dyn Method>>;

    /// Current value of a static field declared by this type.
    fn get_static(&self, name: &str) -> Option<WireValue>;
}
