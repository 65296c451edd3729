use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Dotted address into a form tree, e.g. `items.2.amount`.
///
/// Segments are kept as plain strings. Whether a segment names a field or
/// indexes into a repeatable group is decided while walking the tree: below a
/// group the segment must parse as a 0-based index, everywhere else it is a key.
///
/// Parsing splits on every `.`, so `items..1` keeps an empty segment and
/// addresses nothing. Only the empty string gives the empty path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldPath(pub Vec<String>);

impl FieldPath {
    pub fn new(parts: impl Into<Vec<String>>) -> Self {
        FieldPath(parts.into())
    }

    pub fn from_slice(parts: &[&str]) -> Self {
        FieldPath(parts.iter().map(|s| s.to_string()).collect())
    }

    pub fn push(&mut self, part: impl Into<String>) {
        self.0.push(part.into());
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for FieldPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FieldPath::from(s))
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            return FieldPath(Vec::new());
        }
        FieldPath(s.split('.').map(str::to_string).collect())
    }
}

impl From<String> for FieldPath {
    fn from(s: String) -> Self {
        FieldPath::from(s.as_str())
    }
}

impl From<&String> for FieldPath {
    fn from(s: &String) -> Self {
        FieldPath::from(s.as_str())
    }
}

impl From<Vec<String>> for FieldPath {
    fn from(parts: Vec<String>) -> Self {
        FieldPath(parts)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// One step into a repeatable group: the group's field name and the entry index.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScopeStep {
    pub group: String,
    pub index: usize,
}

/// Location of a sub-form inside the root tree.
///
/// The root form has an empty scope; every `sub_state` call appends one step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Scope(Vec<ScopeStep>);

impl Scope {
    pub fn root() -> Self {
        Scope(Vec::new())
    }

    pub fn child(&self, group: impl Into<String>, index: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(ScopeStep {
            group: group.into(),
            index,
        });
        Scope(steps)
    }

    pub fn steps(&self) -> &[ScopeStep] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The innermost step, if this scope points at a group entry.
    pub fn last(&self) -> Option<&ScopeStep> {
        self.0.last()
    }

    /// Scope of the form that owns the group this scope's entry lives in.
    pub fn parent(&self) -> Option<Scope> {
        let (_, rest) = self.0.split_last()?;
        Some(Scope(rest.to_vec()))
    }

    /// Dotted path of `name` inside this scope.
    pub fn path_to(&self, name: &str) -> FieldPath {
        let mut path = FieldPath(Vec::with_capacity(self.0.len() * 2 + 1));
        for step in &self.0 {
            path.push(step.group.clone());
            path.push(step.index.to_string());
        }
        path.push(name);
        path
    }
}
