//! Placeholder substitution for the xray configuration template.
//!
//! The token set is fixed. Rendering is a literal find-and-replace over that
//! set: no escaping, no expressions, and substituted values are never
//! rescanned for further tokens.

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Placeholders
// ---------------------------------------------------------------------------

/// A recognised placeholder token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Proto,
    UserId,
    WsPath,
    Network,
    Port,
}

impl Placeholder {
    /// Every supported placeholder.
    pub const ALL: [Placeholder; 5] = [
        Placeholder::Proto,
        Placeholder::UserId,
        Placeholder::WsPath,
        Placeholder::Network,
        Placeholder::Port,
    ];

    /// Literal text of the token as it appears in the template.
    pub fn token(self) -> &'static str {
        match self {
            Placeholder::Proto => "__PROTO__",
            Placeholder::UserId => "__USER_ID__",
            Placeholder::WsPath => "__WS_PATH__",
            Placeholder::Network => "__NETWORK__",
            Placeholder::Port => "__PORT__",
        }
    }

    /// Environment variable that supplies the value.
    pub fn env_var(self) -> &'static str {
        match self {
            Placeholder::Proto => "PROTO",
            Placeholder::UserId => "USER_ID",
            Placeholder::WsPath => "WS_PATH",
            Placeholder::Network => "NETWORK",
            Placeholder::Port => "PORT",
        }
    }
}

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// Raw placeholder variables from a snapshot of the environment.
///
/// `None` and `Some("")` both mean "unset".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvOverrides {
    pub proto: Option<String>,
    pub user_id: Option<String>,
    /// Legacy name for `USER_ID`, consulted only when `USER_ID` is unset.
    pub uuid: Option<String>,
    pub ws_path: Option<String>,
    pub network: Option<String>,
    pub port: Option<String>,
}

impl EnvOverrides {
    /// Apply defaults and the `USER_ID` → `UUID` → `changeme` fallback.
    pub fn resolve(&self) -> Bindings {
        let defaults = Bindings::default();
        Bindings {
            proto: pick(&[&self.proto]).unwrap_or(defaults.proto),
            user_id: pick(&[&self.user_id, &self.uuid]).unwrap_or(defaults.user_id),
            ws_path: pick(&[&self.ws_path]).unwrap_or(defaults.ws_path),
            network: pick(&[&self.network]).unwrap_or(defaults.network),
            port: pick(&[&self.port]).unwrap_or(defaults.port),
        }
    }
}

/// First candidate that is set and non-empty.
fn pick(candidates: &[&Option<String>]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .find(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Resolved value for every placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bindings {
    pub proto: String,
    pub user_id: String,
    pub ws_path: String,
    pub network: String,
    pub port: String,
}

impl Default for Bindings {
    fn default() -> Self {
        Self {
            proto: "vless".into(),
            user_id: "changeme".into(),
            ws_path: "/ws".into(),
            network: "ws".into(),
            port: "8080".into(),
        }
    }
}

impl Bindings {
    /// Value substituted for `placeholder`.
    pub fn value(&self, placeholder: Placeholder) -> &str {
        match placeholder {
            Placeholder::Proto => &self.proto,
            Placeholder::UserId => &self.user_id,
            Placeholder::WsPath => &self.ws_path,
            Placeholder::Network => &self.network,
            Placeholder::Port => &self.port,
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Output of [`render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    /// Number of tokens actually replaced.
    pub substitutions: usize,
}

/// Replace every occurrence of every placeholder in `template`.
///
/// The template is raw bytes and need not be UTF-8; only the ASCII tokens
/// are matched. Scans left to right, and at each offset the first matching
/// token in [`Placeholder::ALL`] wins. Anything else is copied through
/// unchanged.
pub fn render(template: &[u8], bindings: &Bindings) -> Rendered {
    let mut bytes = Vec::with_capacity(template.len());
    let mut substitutions = 0;
    let mut rest = template;

    while let Some((&first, tail)) = rest.split_first() {
        if first == b'_' {
            if let Some(p) = Placeholder::ALL
                .iter()
                .find(|p| rest.starts_with(p.token().as_bytes()))
            {
                bytes.extend_from_slice(bindings.value(*p).as_bytes());
                substitutions += 1;
                rest = &rest[p.token().len()..];
                continue;
            }
        }
        bytes.push(first);
        rest = tail;
    }

    Rendered {
        bytes,
        substitutions,
    }
}
