//! Constant pool for compiled units.
//!
//! The constant pool stores values that are referenced by bytecode instructions:
//! numeric literals, string literals, member and global names, and import
//! references.

use rustc_hash::FxHashMap;

/// Values stored in the constant pool.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Native-width integer literal.
    Int(i32),
    /// Wide integer literal.
    Long(i64),
    /// Floating point literal.
    Double(f64),
    /// Arbitrary-precision integer literal, as canonical decimal text.
    BigInt(String),
    /// String literal, or a member/global/operator name.
    Str(String),
    /// A dotted import path plus its leaf name (`None` for a star import).
    Import {
        path: Vec<String>,
        target: Option<String>,
    },
}

impl Constant {
    /// Whether the constant is a numeric literal materialized by a bootstrap.
    pub fn is_bootstrapped(&self) -> bool {
        matches!(
            self,
            Constant::Int(_) | Constant::Long(_) | Constant::Double(_) | Constant::BigInt(_)
        )
    }

    /// The string payload, if this is a string constant.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Constant::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Unit-level constant pool with deduplication.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstantPool {
    constants: Vec<Constant>,
    /// Deduplication index: maps constant to its index.
    index: FxHashMap<ConstantKey, u32>,
}

/// Key for constant deduplication (hashable version of Constant).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConstantKey {
    Int(i32),
    Long(i64),
    Double(u64), // Bit pattern for hashing
    BigInt(String),
    Str(String),
    Import(Vec<String>, Option<String>),
}

impl ConstantPool {
    /// Create a new empty constant pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or get existing constant, returns index.
    ///
    /// Deduplicates identical constants.
    pub fn add(&mut self, constant: Constant) -> u32 {
        let key = Self::to_key(&constant);

        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }

        let idx = self.constants.len() as u32;
        self.constants.push(constant);
        self.index.insert(key, idx);
        idx
    }

    /// Add a string constant.
    pub fn add_str(&mut self, value: &str) -> u32 {
        self.add(Constant::Str(value.to_string()))
    }

    /// Get constant by index.
    pub fn get(&self, index: u32) -> Option<&Constant> {
        self.constants.get(index as usize)
    }

    /// Get all constants.
    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    fn to_key(constant: &Constant) -> ConstantKey {
        match constant {
            Constant::Int(v) => ConstantKey::Int(*v),
            Constant::Long(v) => ConstantKey::Long(*v),
            Constant::Double(v) => ConstantKey::Double(v.to_bits()),
            Constant::BigInt(s) => ConstantKey::BigInt(s.clone()),
            Constant::Str(s) => ConstantKey::Str(s.clone()),
            Constant::Import { path, target } => ConstantKey::Import(path.clone(), target.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pool_is_empty() {
        let pool = ConstantPool::new();
        assert!(pool.is_empty());
        assert_eq!(pool.get(0), None);
    }

    #[test]
    fn deduplication() {
        let mut pool = ConstantPool::new();

        let idx1 = pool.add(Constant::Int(100));
        let idx2 = pool.add(Constant::Long(100));
        let idx3 = pool.add(Constant::Int(100));

        assert_eq!(idx1, 0);
        assert_eq!(idx2, 1);
        assert_eq!(idx3, 0);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn double_deduplication_by_bits() {
        let mut pool = ConstantPool::new();

        let idx1 = pool.add(Constant::Double(1.0));
        let idx2 = pool.add(Constant::Double(1.0));
        let idx3 = pool.add(Constant::Double(-0.0));

        assert_eq!(idx1, idx2);
        assert_ne!(idx1, idx3);
    }

    #[test]
    fn string_and_import_constants() {
        let mut pool = ConstantPool::new();
        let name = pool.add_str("println");
        let import = pool.add(Constant::Import {
            path: vec!["glang".into()],
            target: Some("BuiltinsNs".into()),
        });

        assert_eq!(pool.get(name).and_then(Constant::as_str), Some("println"));
        assert!(matches!(pool.get(import), Some(Constant::Import { target: Some(t), .. }) if t == "BuiltinsNs"));
        assert_eq!(pool.add_str("println"), name);
    }

    #[test]
    fn bootstrapped_kinds() {
        assert!(Constant::BigInt("1".into()).is_bootstrapped());
        assert!(Constant::Double(0.5).is_bootstrapped());
        assert!(!Constant::Str("x".into()).is_bootstrapped());
    }
}
