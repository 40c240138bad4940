use serde::Serialize;
use std::any::TypeId;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of one concrete type.
///
/// Equality and hashing only look at the `TypeId`; the name is kept for
/// logs and error messages.
#[derive(Clone, Copy)]
pub struct TypeIdentity {
    id: TypeId,
    name: &'static str,
}

impl TypeIdentity {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name with module paths stripped, e.g. `Foo<Bar>` instead of
    /// `crate::a::Foo<crate::b::Bar>`.
    pub fn short_name(&self) -> String {
        shorten_type_name(self.name)
    }
}

impl PartialEq for TypeIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeIdentity {}

impl Hash for TypeIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeIdentity").field(&self.name).finish()
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

fn shorten_type_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut segment = String::new();

    for c in name.chars() {
        match c {
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | '&' | ';' => {
                out.push_str(segment.rsplit("::").next().unwrap_or(&segment));
                segment.clear();
                out.push(c);
            }
            _ => segment.push(c),
        }
    }
    out.push_str(segment.rsplit("::").next().unwrap_or(&segment));
    out
}

/// Role a template parameter plays once closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamRole {
    Request,
    Response,
    Command,
    Result,
}

impl fmt::Display for ParamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = match self {
            ParamRole::Request => "request",
            ParamRole::Response => "response",
            ParamRole::Command => "command",
            ParamRole::Result => "result",
        };
        f.write_str(role)
    }
}

/// Lookup key for an open generic template: its name and the ordered roles
/// of its unbound parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpenTypeKey {
    template: Cow<'static, str>,
    roles: Vec<ParamRole>,
}

impl OpenTypeKey {
    pub fn new(
        template: impl Into<Cow<'static, str>>,
        roles: impl IntoIterator<Item = ParamRole>,
    ) -> Self {
        Self {
            template: template.into(),
            roles: roles.into_iter().collect(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn roles(&self) -> &[ParamRole] {
        &self.roles
    }

    pub fn arity(&self) -> usize {
        self.roles.len()
    }
}

impl fmt::Display for OpenTypeKey {
    /// Renders the unbound shape, e.g. `AotGenericPostProcessor<,>`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<{}>", self.template, ",".repeat(self.arity().saturating_sub(1)))
    }
}

/// Implemented by zero-sized markers that stand for an open template.
pub trait OpenGeneric: 'static {
    const TEMPLATE: &'static str;
    const ROLES: &'static [ParamRole];

    fn open_key() -> OpenTypeKey {
        OpenTypeKey::new(Self::TEMPLATE, Self::ROLES.iter().copied())
    }
}

/// Ordered concrete types that close an open template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ClosingArguments(Vec<TypeIdentity>);

impl ClosingArguments {
    pub fn new(args: impl IntoIterator<Item = TypeIdentity>) -> Self {
        Self(args.into_iter().collect())
    }

    pub fn of<A: 'static>() -> Self {
        Self(vec![TypeIdentity::of::<A>()])
    }

    pub fn pair<A: 'static, B: 'static>() -> Self {
        Self(vec![TypeIdentity::of::<A>(), TypeIdentity::of::<B>()])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeIdentity> {
        self.0.iter()
    }
}

impl fmt::Display for ClosingArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, arg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str("]")
    }
}
