use scb_common::MinorUnits;
use stripe_tools::ShippingOption;

/// Carts at or above this total (in minor units) ship for free.
pub const FREE_SHIPPING_THRESHOLD: i64 = 15_000;
const FREE_SHIPPING_LABEL: &str = "Darmowa dostawa DPD";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    English,
    Polish,
}

impl Locale {
    /// Sessions carry loose locale strings ("pl", "pl-PL", "auto", nothing at all). Anything
    /// that is not recognizably Polish renders as English.
    pub fn from_session(locale: Option<&str>) -> Self {
        match locale {
            Some(l) if l == "pl" || l.starts_with("pl-") => Locale::Polish,
            _ => Locale::English,
        }
    }
}

/// Locale-dependent boilerplate attached to every submitted order.
#[derive(Debug, Clone, Copy)]
pub struct LocaleText {
    pub order_note: &'static str,
    pub order_tags: &'static [&'static str],
}

/// A known delivery service tier. `keywords` are compared as lowercase substrings of the chosen
/// rate's display name, so a single entry covers both the Polish and English spellings.
#[derive(Debug, Clone)]
pub struct ShippingTier {
    pub code: &'static str,
    pub keywords: &'static [&'static str],
    pub label_en: &'static str,
    pub label_pl: &'static str,
    /// What the tier costs at checkout, in minor units.
    pub amount: i64,
    pub min_business_days: u32,
    pub max_business_days: u32,
}

impl ShippingTier {
    pub fn matches(&self, display_name: &str) -> bool {
        let name = display_name.to_lowercase();
        self.keywords.iter().any(|k| name.contains(k))
    }

    pub fn label(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::English => self.label_en,
            Locale::Polish => self.label_pl,
        }
    }

    fn checkout_option(&self) -> ShippingOption {
        ShippingOption {
            display_name: self.label_pl.to_string(),
            amount: MinorUnits::from(self.amount),
            currency: "pln".to_string(),
            min_business_days: self.min_business_days,
            max_business_days: self.max_business_days,
        }
    }
}

/// The one home for every mapping rule the normalizer and submitter share: locale texts and the
/// shipping-tier table. Handlers receive a single instance through app data instead of declaring
/// their own literals.
#[derive(Debug, Clone)]
pub struct MappingConfig {
    pub version: u32,
    tiers: Vec<ShippingTier>,
    english: LocaleText,
    polish: LocaleText,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            version: 1,
            tiers: vec![
                ShippingTier {
                    code: "standard",
                    keywords: &["standard"],
                    label_en: "DPD Standard Delivery",
                    label_pl: "DPD – Dostawa standardowa",
                    amount: 2000,
                    min_business_days: 3,
                    max_business_days: 8,
                },
                ShippingTier {
                    code: "express",
                    keywords: &["express", "ekspres"],
                    label_en: "DPD Express Delivery",
                    label_pl: "DPD – Dostawa ekspresowa",
                    amount: 3500,
                    min_business_days: 2,
                    max_business_days: 5,
                },
            ],
            english: LocaleText { order_note: "Paid via Przelewy24 using Stripe Checkout", order_tags: &["P24"] },
            polish: LocaleText {
                order_note: "Opłacono przez Przelewy24 (Stripe Checkout)",
                order_tags: &["Przelewy24"],
            },
        }
    }
}

impl MappingConfig {
    pub fn text(&self, locale: Locale) -> &LocaleText {
        match locale {
            Locale::English => &self.english,
            Locale::Polish => &self.polish,
        }
    }

    /// The first tier whose keywords appear in the display name, in table order.
    pub fn resolve_tier(&self, display_name: &str) -> Option<&ShippingTier> {
        self.tiers.iter().find(|t| t.matches(display_name))
    }

    /// The delivery choices offered at checkout. Carts at or above the free-shipping threshold
    /// get a single free option; everything else picks between the paid tiers.
    pub fn shipping_options_for_total(&self, total: MinorUnits) -> Vec<ShippingOption> {
        if total.value() >= FREE_SHIPPING_THRESHOLD {
            return vec![ShippingOption {
                display_name: FREE_SHIPPING_LABEL.to_string(),
                amount: MinorUnits::from(0),
                currency: "pln".to_string(),
                min_business_days: 3,
                max_business_days: 8,
            }];
        }
        self.tiers.iter().map(|t| t.checkout_option()).collect()
    }
}
