use serde::{Deserialize, Serialize};

/// Asset class shown as a watchlist category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetCategory {
    Stock,
    Crypto,
    Index,
    Forex,
}

/// Category filter applied to the watchlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(AssetCategory),
}

impl CategoryFilter {
    pub fn matches(&self, category: AssetCategory) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => *c == category,
        }
    }
}

/// A watchlist asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub symbol: String,
    pub name: String,
    pub category: AssetCategory,
}

impl Asset {
    /// Symbols are stored trimmed and uppercased, matching cache keys.
    pub fn new(symbol: &str, name: &str, category: AssetCategory) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            name: name.to_string(),
            category,
        }
    }

    /// Re-normalize an asset built with a struct literal or deserialized.
    pub fn normalized(self) -> Self {
        Self::new(&self.symbol, &self.name, self.category)
    }

    /// Case-insensitive match against symbol or name.
    pub fn matches_query(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        self.symbol.to_lowercase().contains(&q) || self.name.to_lowercase().contains(&q)
    }
}

/// Lightweight price quote from a batch quote call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

const DEFAULT_ASSETS: &[(&str, &str, AssetCategory)] = &[
    // Indices / ETFs
    ("SPY", "S&P 500", AssetCategory::Index),
    ("QQQ", "Nasdaq 100", AssetCategory::Index),
    ("IWM", "Russell 2000", AssetCategory::Index),
    ("DIA", "Dow Jones", AssetCategory::Index),
    ("GLD", "Gold", AssetCategory::Index),
    ("SLV", "Silver", AssetCategory::Index),
    ("TLT", "20+ Yr Treasury", AssetCategory::Index),
    ("VIX", "Volatility Index", AssetCategory::Index),
    // Crypto
    ("BTC-USD", "Bitcoin", AssetCategory::Crypto),
    ("ETH-USD", "Ethereum", AssetCategory::Crypto),
    ("SOL-USD", "Solana", AssetCategory::Crypto),
    ("DOGE-USD", "Dogecoin", AssetCategory::Crypto),
    ("XRP-USD", "XRP", AssetCategory::Crypto),
    ("ADA-USD", "Cardano", AssetCategory::Crypto),
    ("AVAX-USD", "Avalanche", AssetCategory::Crypto),
    ("SHIB-USD", "Shiba Inu", AssetCategory::Crypto),
    ("DOT-USD", "Polkadot", AssetCategory::Crypto),
    ("LINK-USD", "Chainlink", AssetCategory::Crypto),
    ("MATIC-USD", "Polygon", AssetCategory::Crypto),
    // Big tech / AI
    ("NVDA", "NVIDIA", AssetCategory::Stock),
    ("AAPL", "Apple", AssetCategory::Stock),
    ("MSFT", "Microsoft", AssetCategory::Stock),
    ("AMZN", "Amazon", AssetCategory::Stock),
    ("GOOGL", "Alphabet", AssetCategory::Stock),
    ("META", "Meta", AssetCategory::Stock),
    ("TSLA", "Tesla", AssetCategory::Stock),
    ("AMD", "AMD", AssetCategory::Stock),
    ("AVGO", "Broadcom", AssetCategory::Stock),
    ("ORCL", "Oracle", AssetCategory::Stock),
    ("CRM", "Salesforce", AssetCategory::Stock),
    ("INTC", "Intel", AssetCategory::Stock),
    ("IBM", "IBM", AssetCategory::Stock),
    ("PLTR", "Palantir", AssetCategory::Stock),
    ("SMCI", "Super Micro", AssetCategory::Stock),
    // Finance / fintech
    ("JPM", "JPMorgan", AssetCategory::Stock),
    ("BAC", "Bank of America", AssetCategory::Stock),
    ("V", "Visa", AssetCategory::Stock),
    ("MA", "Mastercard", AssetCategory::Stock),
    ("GS", "Goldman Sachs", AssetCategory::Stock),
    ("MS", "Morgan Stanley", AssetCategory::Stock),
    ("BLK", "BlackRock", AssetCategory::Stock),
    ("COIN", "Coinbase", AssetCategory::Stock),
    ("HOOD", "Robinhood", AssetCategory::Stock),
    ("PYPL", "PayPal", AssetCategory::Stock),
    ("SQ", "Block", AssetCategory::Stock),
    // Consumer & retail
    ("WMT", "Walmart", AssetCategory::Stock),
    ("COST", "Costco", AssetCategory::Stock),
    ("TGT", "Target", AssetCategory::Stock),
    ("KO", "Coca-Cola", AssetCategory::Stock),
    ("PEP", "PepsiCo", AssetCategory::Stock),
    ("MCD", "McDonald's", AssetCategory::Stock),
    ("SBUX", "Starbucks", AssetCategory::Stock),
    ("NKE", "Nike", AssetCategory::Stock),
    ("DIS", "Disney", AssetCategory::Stock),
    ("NFLX", "Netflix", AssetCategory::Stock),
    // Health & industrial
    ("LLY", "Eli Lilly", AssetCategory::Stock),
    ("JNJ", "Johnson & Johnson", AssetCategory::Stock),
    ("UNH", "UnitedHealth", AssetCategory::Stock),
    ("PFE", "Pfizer", AssetCategory::Stock),
    ("XOM", "Exxon Mobil", AssetCategory::Stock),
    ("CVX", "Chevron", AssetCategory::Stock),
    ("CAT", "Caterpillar", AssetCategory::Stock),
    ("GE", "General Electric", AssetCategory::Stock),
    ("BA", "Boeing", AssetCategory::Stock),
    ("LMT", "Lockheed Martin", AssetCategory::Stock),
    // Forex
    ("EURUSD=X", "EUR/USD", AssetCategory::Forex),
    ("GBPUSD=X", "GBP/USD", AssetCategory::Forex),
    ("USDJPY=X", "USD/JPY", AssetCategory::Forex),
    ("USDCHF=X", "USD/CHF", AssetCategory::Forex),
    ("AUDUSD=X", "AUD/USD", AssetCategory::Forex),
    ("USDCAD=X", "USD/CAD", AssetCategory::Forex),
    // Germany (DAX)
    ("SAP.DE", "SAP", AssetCategory::Stock),
    ("SIE.DE", "Siemens", AssetCategory::Stock),
    ("ALV.DE", "Allianz", AssetCategory::Stock),
    ("DTE.DE", "Deutsche Telekom", AssetCategory::Stock),
    ("AIR.DE", "Airbus", AssetCategory::Stock),
    ("BMW.DE", "BMW", AssetCategory::Stock),
    ("MBG.DE", "Mercedes-Benz", AssetCategory::Stock),
    ("VOW3.DE", "Volkswagen", AssetCategory::Stock),
    ("BAS.DE", "BASF", AssetCategory::Stock),
    ("IFX.DE", "Infineon", AssetCategory::Stock),
    ("ADS.DE", "Adidas", AssetCategory::Stock),
    ("DHL.DE", "DHL Group", AssetCategory::Stock),
    ("MUV2.DE", "Munich Re", AssetCategory::Stock),
];

/// The watchlist a fresh session starts with.
pub fn default_watchlist() -> Vec<Asset> {
    DEFAULT_ASSETS
        .iter()
        .map(|(symbol, name, category)| Asset::new(symbol, name, *category))
        .collect()
}
