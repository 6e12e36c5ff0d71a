use std::{borrow::Cow, fmt};

/// Hex rendering of a raw device frame for logs and errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Displayable<'a>(Cow<'a, [u8]>);

impl<'a> From<&'a [u8]> for Displayable<'a> {
    fn from(msg: &'a [u8]) -> Self {
        Self(Cow::Borrowed(msg))
    }
}

impl<'a> Displayable<'a> {
    pub fn owned(msg: &[u8]) -> Displayable<'static> {
        Displayable(Cow::Owned(msg.to_vec()))
    }
}

impl<'a> fmt::Display for Displayable<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut iter = self.0.iter();

        match iter.next() {
            Some(first) => write!(f, "(hex): {first:02x}")?,
            None => return f.write_str("(empty)"),
        };

        for val in iter {
            write!(f, ", {val:02x}")?;
        }

        Ok(())
    }
}
