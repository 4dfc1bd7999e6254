//! Ordered route table with named path parameters.
//!
//! Routes are tried in registration order and the first one whose [PathSpec] matches the request
//! path (and whose method matches) wins.
use http::Method;
use percent_encoding::percent_decode_str;
use std::fmt;

/// Expands to a path specification.
///
/// # Routable segments
/// A [path!] invocation may contain any number of static, dynamic, or optional segments
/// separated by forward slashes. Static segments are literal strings and must be matched
/// (ascii case-insensitively) when a request comes in. Dynamic segments match any non-empty
/// segment and are exposed by name in the resulting [Params], after percent-decoding.
///
/// ```
/// use hypercalc::path;
///
/// // /
/// path![];
///
/// // /one
/// path!["one"];
/// // /one/two
/// path!["one" / "two"];
///
/// // /:one
/// path![one];
/// // /one/:two/three
/// path!["one" / two / "three"];
/// ```
///
/// Optional segments are dynamic segments followed by `?`. They may only appear at the end of
/// a [path!], and a request may omit any suffix of them.
///
/// ```
/// use hypercalc::path;
///
/// // /:a/:b?/:c?
/// let spec = path![a / b? / c?];
///
/// assert!(spec.matches("/1").is_some());
/// assert!(spec.matches("/1/2").is_some());
/// assert!(spec.matches("/1/2/3").is_some());
/// assert!(spec.matches("/1/2/3/4").is_none());
/// ```
#[macro_export]
macro_rules! path {
    ($( $token:tt )*) => {
        $crate::__path_internal![
            [$crate::route::PathSpec::ROOT]
            $( $token )*
        ]
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __path_internal {
    ([$spec:expr]) => {
        $spec
    };

    // 1 static seg
    ([$spec:expr] $segment:literal) => {
        ($spec).segment($segment)
    };

    // 1 static seg and at least 1 segment
    ([$spec:expr] $segment:literal / $( $token:tt )+) => {
        $crate::__path_internal![
            [($spec).segment($segment)]
            $( $token )+
        ]
    };

    // 1 optional seg
    ([$spec:expr] $name:ident ?) => {
        ($spec).optional(stringify!($name))
    };

    // 1 optional seg and at least 1 segment
    ([$spec:expr] $name:ident ? / $( $token:tt )+) => {
        $crate::__path_internal![
            [($spec).optional(stringify!($name))]
            $( $token )+
        ]
    };

    // 1 dynamic seg
    ([$spec:expr] $name:ident) => {
        ($spec).dynamic(stringify!($name))
    };

    // 1 dynamic seg and at least 1 segment
    ([$spec:expr] $name:ident / $( $token:tt )+) => {
        $crate::__path_internal![
            [($spec).dynamic(stringify!($name))]
            $( $token )+
        ]
    };
}

#[derive(Copy, Clone, Debug)]
struct UriSeg {
    name: &'static str,
    kind: Kind,
}

impl UriSeg {
    const fn new(name: &'static str, kind: Kind) -> Self {
        Self { name, kind }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Kind {
    Static,
    Dynamic,
    Optional,
}

/// A uri specification.
///
/// See the [path!] macro for usage details.
#[derive(Clone, Debug)]
pub struct PathSpec {
    segs: Vec<UriSeg>,
}

impl fmt::Display for PathSpec {
    /// ```
    /// use hypercalc::path;
    ///
    /// assert_eq!("/", path![].to_string());
    /// assert_eq!("/history", path!["history"].to_string());
    /// assert_eq!("/:a/op/:b?", path![a / "op" / b?].to_string());
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/")?;

        let mut it = self.segs.iter().peekable();

        while let Some(UriSeg { name, kind }) = it.next() {
            match kind {
                Kind::Static => write!(f, "{}", name)?,
                Kind::Dynamic => write!(f, ":{}", name)?,
                Kind::Optional => write!(f, ":{}?", name)?,
            }

            if it.peek().is_some() {
                write!(f, "/")?;
            }
        }

        Ok(())
    }
}

impl PathSpec {
    /// The root path.
    pub const ROOT: Self = PathSpec { segs: Vec::new() };

    fn contains_optional(&self) -> bool {
        matches!(
            self.segs.last(),
            Some(s) if s.kind == Kind::Optional
        )
    }

    fn contains_name(&self, name: &str) -> bool {
        (self.segs.iter())
            .filter(|s| s.kind != Kind::Static)
            .any(|s| s.name == name)
    }

    /// Append a static segment to this spec.
    ///
    /// # Panics
    /// This panics if the segment is empty or contains `/`, or if the path spec already contains
    /// an optional segment.
    pub fn segment(mut self, name: &'static str) -> Self {
        assert! { !name.is_empty() && !name.contains('/'),
            "path spec: static segments must be non-empty and cannot contain '/': {:?}",
            name,
        }
        assert! { !self.contains_optional(),
            "path spec: cannot specify static segment after an optional segment",
        }
        self.segs.push(UriSeg::new(name, Kind::Static));

        self
    }

    /// Append a dynamic path parameter to this spec.
    ///
    /// # Panics
    /// This panics if the path spec already contains an optional segment or a parameter with
    /// the same `name`.
    pub fn dynamic(mut self, name: &'static str) -> Self {
        assert! { !self.contains_optional(),
            "path spec: cannot specify param after an optional segment",
        }
        assert! { !self.contains_name(name),
            "path spec: duplicate param {:?}",
            name,
        }
        self.segs.push(UriSeg::new(name, Kind::Dynamic));

        self
    }

    /// Append an optional path parameter to this spec.
    ///
    /// # Panics
    /// This panics if the path spec already contains a parameter with the same `name`.
    pub fn optional(mut self, name: &'static str) -> Self {
        assert! { !self.contains_name(name),
            "path spec: duplicate param {:?}",
            name,
        }
        self.segs.push(UriSeg::new(name, Kind::Optional));

        self
    }

    /// Match `path` against this spec, returning any parameters it contains.
    ///
    /// A single trailing slash is ignored, and the query string (if `path` still carries one)
    /// never takes part in matching.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let mut path = path.split('?').next().unwrap_or_default();

        // split off the leading slash and at most one trailing slash
        path = path.strip_prefix('/')?;
        path = path.strip_suffix('/').unwrap_or(path);

        // the root path has no segments at all, rather than one empty segment
        let mut items = Some(path)
            .filter(|p| !p.is_empty())
            .into_iter()
            .flat_map(|p| p.split('/'))
            .peekable();

        let mut params = Params::default();

        for s in self.segs.iter() {
            match s.kind {
                Kind::Static => match items.next() {
                    Some(item) if item.eq_ignore_ascii_case(s.name) => {}
                    _ => return None,
                },

                Kind::Dynamic => match items.next() {
                    Some(item) if !item.is_empty() => params.push(s.name, item),
                    _ => return None,
                },

                Kind::Optional => match items.next() {
                    Some(item) if !item.is_empty() => params.push(s.name, item),
                    Some(_) => return None,
                    None => {}
                },
            }
        }

        // any leftovers mean this spec is too short for the path
        match items.peek() {
            Some(_) => None,
            None => Some(params),
        }
    }
}

/// Percent-decoded parameters extracted from a request path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
    items: Vec<(&'static str, String)>,
}

impl Params {
    fn push(&mut self, name: &'static str, raw: &str) {
        let val = percent_decode_str(raw).decode_utf8_lossy().into_owned();
        self.items.push((name, val));
    }

    /// Returns the parameter called `name`, if the request path contained it.
    pub fn get(&self, name: &str) -> Option<&str> {
        (self.items.iter())
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the number of parameters present.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if no parameters are present.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// An ordered table of routes, each with an associated entry `H`.
pub struct Router<H> {
    routes: Vec<(Method, PathSpec, H)>,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self { routes: vec![] }
    }
}

impl<H> Router<H> {
    /// Register `entry` to handle `method` requests matching `spec`.
    pub fn insert(&mut self, method: Method, spec: PathSpec, entry: H) {
        tracing::debug!("registering route {} {}", method, spec);
        self.routes.push((method, spec, entry));
    }

    /// Find the first route matching `method` and `path`.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<(&H, Params)> {
        (self.routes.iter())
            .filter(|(m, _, _)| m == method)
            .find_map(|(_, spec, entry)| spec.matches(path).map(|ps| (entry, ps)))
    }
}
