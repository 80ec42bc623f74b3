use crate::ident::Ident;

/// Provide the conversion to [Ident] on the implemented type.
///
/// Used by the graph builder methods. The conversion panics on
/// malformed names.
pub trait IntoIdent {
    fn into_ident(self) -> Ident;
}

impl IntoIdent for String {
    fn into_ident(self) -> Ident {
        Ident::new(&self).unwrap_or_else(|| panic!("invalid identifier '{}'", self))
    }
}

impl IntoIdent for &String {
    fn into_ident(self) -> Ident {
        Ident::new(self).unwrap_or_else(|| panic!("invalid identifier '{}'", self))
    }
}

impl IntoIdent for &str {
    fn into_ident(self) -> Ident {
        Ident::new(self).unwrap_or_else(|| panic!("invalid identifier '{}'", self))
    }
}

impl IntoIdent for Ident {
    fn into_ident(self) -> Ident {
        self
    }
}

impl IntoIdent for &Ident {
    fn into_ident(self) -> Ident {
        self.clone()
    }
}
