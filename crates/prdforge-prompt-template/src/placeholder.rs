use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// A value slot in a prompt template.
///
/// Every slot is recognized under several spellings: the bracketed form
/// found in older prompt files and the brace forms used by newer ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    Title,
    Problems,
    Context,
    /// Content submitted for phase 1.
    DraftOutput,
    /// Content submitted for phase 2.
    ReviewOutput,
}

impl Placeholder {
    pub const ALL: [Placeholder; 5] = [
        Self::Title,
        Self::Problems,
        Self::Context,
        Self::DraftOutput,
        Self::ReviewOutput,
    ];

    /// All spellings of this slot.
    #[must_use]
    pub const fn tokens(self) -> &'static [&'static str] {
        match self {
            Self::Title => &["{title}", "{{TITLE}}"],
            Self::Problems => &[
                "{problems}",
                "{description}",
                "{{PROBLEMS}}",
                "{{DESCRIPTION}}",
            ],
            Self::Context => &["{context}", "{{CONTEXT}}"],
            Self::DraftOutput => &[
                "[PASTE CLAUDE'S ORIGINAL PRD HERE]",
                "[PASTE CLAUDE'S PRD HERE]",
                "[PASTE ORIGINAL PRD HERE]",
                "{phase1Output}",
                "{{PHASE1_OUTPUT}}",
            ],
            Self::ReviewOutput => &[
                "[PASTE GEMINI'S PRD RENDITION HERE]",
                "[PASTE GEMINI'S VERSION HERE]",
                "{phase2Output}",
                "{{PHASE2_OUTPUT}}",
            ],
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.tokens().contains(&token))
    }
}

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    let mut tokens: Vec<&str> = Placeholder::ALL
        .iter()
        .flat_map(|p| p.tokens().iter().copied())
        .collect();
    tokens.sort_by_key(|t| std::cmp::Reverse(t.len()));
    let alternation = tokens
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&alternation).expect("placeholder tokens form a valid regex")
});

static UPPER_BRACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{[A-Z][A-Z0-9_]*\}\}").expect("valid regex"));

/// Replace every occurrence of every bound placeholder in a single pass.
///
/// Tokens for slots without a binding are left in place. Substituted values
/// are never rescanned, so content that happens to contain a token is
/// inserted verbatim.
#[must_use]
pub fn substitute(template: &str, bindings: &[(Placeholder, &str)]) -> String {
    TOKEN_RE
        .replace_all(template, |caps: &Captures<'_>| {
            let token = &caps[0];
            Placeholder::from_token(token)
                .and_then(|slot| bindings.iter().find(|(bound, _)| *bound == slot))
                .map_or_else(|| token.to_string(), |(_, value)| (*value).to_string())
        })
        .into_owned()
}

/// Fill `%s` slots left to right; `%%` becomes `%`. Missing arguments render
/// as empty strings and surplus arguments are ignored.
#[must_use]
pub fn fill_positional(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len() + args.iter().map(|a| a.len()).sum::<usize>());
    let mut args = args.iter();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('s') => {
                chars.next();
                if let Some(arg) = args.next() {
                    out.push_str(arg);
                }
            }
            Some('%') => {
                chars.next();
                out.push('%');
            }
            _ => out.push('%'),
        }
    }

    out
}

/// `{{UPPER_CASE}}` tokens in `template` that no [`Placeholder`] recognizes.
#[must_use]
pub fn unknown_placeholders(template: &str) -> Vec<String> {
    let mut unknown: Vec<String> = Vec::new();
    for m in UPPER_BRACE_RE.find_iter(template) {
        let token = m.as_str();
        if Placeholder::from_token(token).is_none() && !unknown.iter().any(|u| u == token) {
            unknown.push(token.to_string());
        }
    }
    unknown
}
