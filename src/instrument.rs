use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    USD,
    CAD,
    EUR,
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for Asset {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USD" => Ok(Asset::USD),
            "CAD" => Ok(Asset::CAD),
            "EUR" => Ok(Asset::EUR),
            other => Err(format!("unsupported asset: `{}`", other)),
        }
    }
}

/// A currency pair: base/quote.
///
/// Every order and trade carries one. Each pair gets its own independent
/// book, so orders for different pairs never match each other.
///
/// On the wire a pair is its plain string code, e.g. `"EUR-USD"`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Pair {
    /// The asset being bought or sold
    pub base: Asset,
    /// The asset it is priced in
    pub quote: Asset,
}

impl Pair {
    /// Returns the usual string code, e.g "USD-CAD"
    pub fn code(&self) -> String {
        format!("{}-{}", self.base, self.quote)
    }

    /// Pairs the engine keeps a book for.
    pub fn supported() -> &'static [Pair] {
        &[USD_CAD, EUR_USD]
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.base, self.quote)
    }
}

impl FromStr for Pair {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pair::supported()
            .iter()
            .find(|p| p.code() == s)
            .copied()
            .ok_or_else(|| format!("unsupported symbol: `{}`", s))
    }
}

impl TryFrom<String> for Pair {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Pair> for String {
    fn from(p: Pair) -> Self {
        p.code()
    }
}

pub const USD_CAD: Pair = Pair {
    base: Asset::USD,
    quote: Asset::CAD,
};
pub const EUR_USD: Pair = Pair {
    base: Asset::EUR,
    quote: Asset::USD,
};
