//! Value mirrors: primitives carried by value, objects as live handles.

use std::sync::Arc;

use crate::error::WireError;
use crate::thread::ThreadReference;
use crate::types::ReferenceType;

/// Opaque object identifier minted by the target machine.
///
/// Stable for an object's lifetime within one connection; never reused while
/// the object is referenced, never meaningful across connections.
pub type ObjectId = i64;

// ── ObjectReference ──────────────────────────────────────────────────────────

/// A live handle to an object in the target machine.
pub trait ObjectReference: Send + Sync {
    /// The target-minted identifier for this object.
    fn unique_id(&self) -> ObjectId;

    /// Runtime class of the object.
    fn reference_type(&self) -> Arc<dyn ReferenceType>;

    /// Current value of an instance field, by name.
    ///
    /// Returns `None` when the field does not exist on this object.
    fn get_field(&self, name: &str) -> Option<WireValue>;

    /// Invoke a method on this object inside the given thread.
    ///
    /// With `single_threaded` set, the target resumes only the invoking
    /// thread for the duration of the call.
    fn invoke_method(
        &self,
        thread: &Arc<dyn ThreadReference>,
        name: &str,
        args: &[WireValue],
        single_threaded: bool,
    ) -> Result<WireValue, WireError>;
}

// ── StringReference ──────────────────────────────────────────────────────────

/// A handle to a string object in the target machine.
pub trait StringReference: ObjectReference {
    /// The string's contents, copied out of the target.
    fn value(&self) -> String;
}

// ── ArrayReference ───────────────────────────────────────────────────────────

/// A handle to an array in the target machine.
pub trait ArrayReference: ObjectReference {
    /// Number of elements.
    fn length(&self) -> usize;

    /// Element type name (e.g. `int` for an `int[]`).
    fn element_type_name(&self) -> String;

    /// Copy out `len` elements starting at `offset`.
    fn get_values(&self, offset: usize, len: usize) -> Result<Vec<WireValue>, WireError>;
}

// ── WireValue ────────────────────────────────────────────────────────────────

/// A value read from (or written to) the target machine.
///
/// Primitives travel by value; strings, arrays, and objects are live handles
/// that stay owned by the target.
#[derive(Clone)]
pub enum WireValue {
    Null,
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    String(Arc<dyn StringReference>),
    Array(Arc<dyn ArrayReference>),
    Object(Arc<dyn ObjectReference>),
}

impl WireValue {
    /// The target-side type name of this value.
    pub fn type_name(&self) -> String {
        match self {
            WireValue::Null => "null".to_string(),
            WireValue::Boolean(_) => "boolean".to_string(),
            WireValue::Byte(_) => "byte".to_string(),
            WireValue::Short(_) => "short".to_string(),
            WireValue::Int(_) => "int".to_string(),
            WireValue::Long(_) => "long".to_string(),
            WireValue::Float(_) => "float".to_string(),
            WireValue::Double(_) => "double".to_string(),
            WireValue::Char(_) => "char".to_string(),
            WireValue::String(s) => s.reference_type().name(),
            WireValue::Array(a) => a.reference_type().name(),
            WireValue::Object(o) => o.reference_type().name(),
        }
    }

    /// The object handle behind this value, if it is one.
    pub fn as_object(&self) -> Option<Arc<dyn ObjectReference>> {
        match self {
            WireValue::String(s) => Some(s.clone() as Arc<dyn ObjectReference>),
            WireValue::Array(a) => Some(a.clone() as Arc<dyn ObjectReference>),
            WireValue::Object(o) => Some(o.clone()),
            _ => None,
        }
    }
}

impl std::fmt::Debug for WireValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireValue::Null => write!(f, "Null"),
            WireValue::Boolean(v) => write!(f, "Boolean({v})"),
            WireValue::Byte(v) => write!(f, "Byte({v})"),
            WireValue::Short(v) => write!(f, "Short({v})"),
            WireValue::Int(v) => write!(f, "Int({v})"),
            WireValue::Long(v) => write!(f, "Long({v})"),
            WireValue::Float(v) => write!(f, "Float({v})"),
            WireValue::Double(v) => write!(f, "Double({v})"),
            WireValue::Char(v) => write!(f, "Char({v:?})"),
            WireValue::String(s) => write!(f, "String(#{})", s.unique_id()),
            WireValue::Array(a) => write!(f, "Array(#{})", a.unique_id()),
            WireValue::Object(o) => write!(f, "Object(#{})", o.unique_id()),
        }
    }
}
