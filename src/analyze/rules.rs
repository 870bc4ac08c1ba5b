//! Declarative rule reducer shared by the scorers.
//!
//! A rule is a named, pure check over some input that yields at most one
//! `Finding` (a signed score delta plus a user-facing message). `reduce` folds
//! an ordered rule slice into a `Tally`; the slice order is the order issues and
//! benefits appear in the report, so reports are reproducible.

/// Whether a finding counts against or in favour of the product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Issue,
    Benefit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub delta: i32,
    pub polarity: Polarity,
    pub message: String,
}

impl Finding {
    pub fn issue(delta: i32, message: impl Into<String>) -> Self {
        Self {
            delta,
            polarity: Polarity::Issue,
            message: message.into(),
        }
    }

    pub fn benefit(delta: i32, message: impl Into<String>) -> Self {
        Self {
            delta,
            polarity: Polarity::Benefit,
            message: message.into(),
        }
    }
}

/// One independent check. `check` must be side-effect free.
pub struct Rule<I: ?Sized> {
    pub name: &'static str,
    pub check: fn(&I) -> Option<Finding>,
}

impl<I: ?Sized> Rule<I> {
    pub const fn new(name: &'static str, check: fn(&I) -> Option<Finding>) -> Self {
        Self { name, check }
    }
}

/// Running result of a rule pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    pub score: i32,
    pub issues: Vec<String>,
    pub benefits: Vec<String>,
}

impl Tally {
    pub fn push(&mut self, finding: Finding) {
        self.score += finding.delta;
        match finding.polarity {
            Polarity::Issue => self.issues.push(finding.message),
            Polarity::Benefit => self.benefits.push(finding.message),
        }
    }

    /// Append another tally verbatim: score summed, messages kept in order.
    pub fn absorb(&mut self, other: Tally) {
        self.score += other.score;
        self.issues.extend(other.issues);
        self.benefits.extend(other.benefits);
    }
}

/// Apply `rules` in order and collect every finding.
pub fn reduce<I: ?Sized>(rules: &[Rule<I>], input: &I) -> Tally {
    let mut tally = Tally::default();
    for rule in rules {
        if let Some(finding) = (rule.check)(input) {
            tally.push(finding);
        }
    }
    tally
}
