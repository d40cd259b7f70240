use std::fmt::{self, Display, Formatter};

/// The closed type universe the checker reasons about. `Unknown` is the
/// inference bottom: any use of it at emit time is an error-shaped situation
/// (see `syntax::errors::ParsingMessage::TypeInferenceFailure`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BaseKind {
    Integer,
    Float,
    String,
    Boolean,
    Channel(Box<ChannelTypeInfo>),
    Array(Box<ArrayTypeInfo>),
    Struct(String),
    Unknown,
    Void,
}

impl BaseKind {
    /// The Rust surface type this kind maps to, used both for mangling and
    /// for the (out-of-core) emitter.
    pub fn rust_type(&self) -> String {
        return match self {
            BaseKind::Integer => "i64".to_string(),
            BaseKind::Float => "f64".to_string(),
            BaseKind::String => "String".to_string(),
            BaseKind::Boolean => "bool".to_string(),
            BaseKind::Channel(info) => format!("Channel<{}>", info.element_type.rust_type()),
            BaseKind::Array(info) => format!("Vec<{}>", info.element_type.rust_type()),
            BaseKind::Struct(name) => name.clone(),
            BaseKind::Unknown => "_".to_string(),
            BaseKind::Void => "()".to_string(),
        };
    }

    /// The component used inside a mangled specialization name. Differs from
    /// `rust_type` in that it must be a bare identifier fragment (no
    /// generics, angle brackets, or whitespace).
    pub fn mangle_component(&self) -> String {
        return match self {
            BaseKind::Integer => "i64".to_string(),
            BaseKind::Float => "f64".to_string(),
            BaseKind::String => "String".to_string(),
            BaseKind::Boolean => "bool".to_string(),
            BaseKind::Channel(info) => format!("Channel_{}", info.element_type.mangle_component()),
            BaseKind::Array(info) => format!("Array_{}", info.element_type.mangle_component()),
            BaseKind::Struct(name) => name.clone(),
            BaseKind::Unknown => "Unknown".to_string(),
            BaseKind::Void => "Void".to_string(),
        };
    }

    pub fn is_unknown(&self) -> bool {
        return matches!(self, BaseKind::Unknown);
    }
}

impl Display for BaseKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        return write!(f, "{}", self.rust_type());
    }
}

/// The promotion rule from spec.md §3: `L == R` keeps `L`; `{Integer, Float}`
/// promotes to `Float`; anything else is `Unknown`.
pub fn promote(left: &BaseKind, right: &BaseKind) -> BaseKind {
    if left == right {
        return left.clone();
    }
    if matches!((left, right), (BaseKind::Integer, BaseKind::Float) | (BaseKind::Float, BaseKind::Integer)) {
        return BaseKind::Float;
    }
    return BaseKind::Unknown;
}

/// Element type plus the capacity distinction, attached to a single channel
/// variable at its creation site. Monotonic: `element_type` only ever moves
/// `Unknown -> concrete`, never back (spec.md invariant 6 / P4).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChannelTypeInfo {
    pub element_type: BaseKind,
    pub bounded: bool,
}

impl ChannelTypeInfo {
    pub fn new(bounded: bool) -> Self {
        return Self { element_type: BaseKind::Unknown, bounded };
    }

    /// Fixes the element type the first time a concrete type is observed.
    /// Returns `false` if a conflicting concrete type was already recorded
    /// (spec.md error kind 4, Conflicting type evidence).
    pub fn observe(&mut self, observed: &BaseKind) -> bool {
        if observed.is_unknown() {
            return true;
        }
        if self.element_type.is_unknown() {
            self.element_type = observed.clone();
            return true;
        }
        return &self.element_type == observed;
    }

    pub fn rust_sender_type(&self) -> String {
        return format!("Sender<{}>", self.element_type.rust_type());
    }

    pub fn rust_receiver_type(&self) -> String {
        return format!("Receiver<{}>", self.element_type.rust_type());
    }
}

/// Element type plus the growable flag, attached to a single array
/// variable. `growable` starts `false` and is promoted to `true` upon any
/// observed append-style mutation (spec.md §3).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArrayTypeInfo {
    pub element_type: BaseKind,
    pub growable: bool,
}

impl ArrayTypeInfo {
    pub fn new(element_type: BaseKind) -> Self {
        return Self { element_type, growable: false };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotion_same_type_is_identity() {
        assert_eq!(promote(&BaseKind::Integer, &BaseKind::Integer), BaseKind::Integer);
        assert_eq!(promote(&BaseKind::String, &BaseKind::String), BaseKind::String);
    }

    #[test]
    fn promotion_int_float_pair_promotes_to_float() {
        assert_eq!(promote(&BaseKind::Integer, &BaseKind::Float), BaseKind::Float);
        assert_eq!(promote(&BaseKind::Float, &BaseKind::Integer), BaseKind::Float);
    }

    #[test]
    fn promotion_mismatched_pair_is_unknown() {
        assert_eq!(promote(&BaseKind::String, &BaseKind::Integer), BaseKind::Unknown);
        assert_eq!(promote(&BaseKind::Boolean, &BaseKind::String), BaseKind::Unknown);
    }

    #[test]
    fn channel_observe_fixes_then_detects_conflict() {
        let mut info = ChannelTypeInfo::new(false);
        assert!(info.observe(&BaseKind::Integer));
        assert_eq!(info.element_type, BaseKind::Integer);
        assert!(info.observe(&BaseKind::Integer));
        assert!(!info.observe(&BaseKind::String));
        // monotonic: the earlier successful fix is not clobbered by the conflict
        assert_eq!(info.element_type, BaseKind::Integer);
    }
}
