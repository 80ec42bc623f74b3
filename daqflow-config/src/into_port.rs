use crate::port::PortRef;
use std::str::FromStr;

/// Provide the conversion to [PortRef] on the implemented type.
pub trait IntoPortRef {
    fn into_port_ref(self) -> PortRef;
}

impl IntoPortRef for String {
    fn into_port_ref(self) -> PortRef {
        PortRef::from_str(&self).unwrap_or_else(|err| panic!("{}", err))
    }
}

impl IntoPortRef for &String {
    fn into_port_ref(self) -> PortRef {
        PortRef::from_str(self).unwrap_or_else(|err| panic!("{}", err))
    }
}

impl IntoPortRef for &str {
    fn into_port_ref(self) -> PortRef {
        PortRef::from_str(self).unwrap_or_else(|err| panic!("{}", err))
    }
}

impl IntoPortRef for PortRef {
    fn into_port_ref(self) -> PortRef {
        self
    }
}

impl IntoPortRef for &PortRef {
    fn into_port_ref(self) -> PortRef {
        self.clone()
    }
}
