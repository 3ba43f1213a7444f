//! Message texts and locale formatting.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use domain::{LowStockNotice, Money, OrderStatus, OrderStatusNotice, Quantity};

/// Languages messages can be written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Language {
    #[default]
    Uzbek,
    Russian,
}

impl Language {
    /// Parses a language code such as `"uz"`, `"RU"` or `"ru-RU"`.
    pub fn from_code(code: &str) -> Option<Self> {
        let primary = code.trim().split(['-', '_']).next().unwrap_or_default();
        match primary.to_ascii_lowercase().as_str() {
            "uz" => Some(Language::Uzbek),
            "ru" => Some(Language::Russian),
            _ => None,
        }
    }

    /// Picks the language for a stored code, falling back to `default`.
    pub fn resolve(code: Option<&str>, default: Language) -> Self {
        code.and_then(Self::from_code).unwrap_or(default)
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::Uzbek => "uz",
            Language::Russian => "ru",
        }
    }

    fn locale(&self) -> &'static Locale {
        match self {
            Language::Uzbek => &UZBEK,
            Language::Russian => &RUSSIAN,
        }
    }
}

/// Number, date and label conventions of a language.
struct Locale {
    date_format: &'static str,
    thousands_separator: char,
    decimal_separator: char,
    currency: &'static str,
    generic_status: &'static str,
    order_label: &'static str,
    date_label: &'static str,
    total_label: &'static str,
    low_stock_title: &'static str,
    category_label: &'static str,
    product_type_label: &'static str,
    product_label: &'static str,
    remaining_label: &'static str,
}

const UZBEK: Locale = Locale {
    date_format: "%d.%m.%Y %H:%M",
    thousands_separator: ' ',
    decimal_separator: ',',
    currency: "so'm",
    generic_status: "📦 Buyurtma holati o‘zgardi.",
    order_label: "Buyurtma",
    date_label: "Sana",
    total_label: "Jami",
    low_stock_title: "⚠️ Mahsulot tugab qolmoqda",
    category_label: "Kategoriya",
    product_type_label: "Turi",
    product_label: "Mahsulot",
    remaining_label: "Qoldiq",
};

const RUSSIAN: Locale = Locale {
    date_format: "%d.%m.%Y %H:%M",
    thousands_separator: ' ',
    decimal_separator: ',',
    currency: "сум",
    generic_status: "📦 Статус заказа изменён.",
    order_label: "Заказ",
    date_label: "Дата",
    total_label: "Итого",
    low_stock_title: "⚠️ Товар заканчивается",
    category_label: "Категория",
    product_type_label: "Тип",
    product_label: "Товар",
    remaining_label: "Остаток",
};

/// Per-language status texts with a generic fallback.
///
/// Renders HTML for Telegram's `parse_mode=HTML`; user-supplied names are
/// escaped.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    status_texts: HashMap<(Language, OrderStatus), String>,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        let texts = [
            (Language::Uzbek, OrderStatus::Preparing, "🍳 Buyurtmangiz tayyorlanmoqda."),
            (Language::Uzbek, OrderStatus::Delivering, "🚚 Buyurtmangiz yo‘lda."),
            (Language::Uzbek, OrderStatus::Completed, "✅ Buyurtmangiz yakunlandi!"),
            (Language::Uzbek, OrderStatus::Cancelled, "❌ Buyurtmangiz bekor qilindi."),
            (Language::Russian, OrderStatus::Preparing, "🍳 Ваш заказ готовится."),
            (Language::Russian, OrderStatus::Delivering, "🚚 Ваш заказ в пути."),
            (Language::Russian, OrderStatus::Completed, "✅ Ваш заказ завершён!"),
            (Language::Russian, OrderStatus::Cancelled, "❌ Ваш заказ отменён."),
        ];
        Self {
            status_texts: texts
                .into_iter()
                .map(|(language, status, text)| ((language, status), text.to_string()))
                .collect(),
        }
    }
}

impl MessageCatalog {
    /// A catalog with no per-status texts; every status uses the generic text.
    pub fn empty() -> Self {
        Self {
            status_texts: HashMap::new(),
        }
    }

    /// Sets the text for a status in a language.
    pub fn with_status_text(
        mut self,
        language: Language,
        status: OrderStatus,
        text: impl Into<String>,
    ) -> Self {
        self.status_texts.insert((language, status), text.into());
        self
    }

    /// Text announcing `status`, or the language's generic text.
    pub fn status_text(&self, language: Language, status: OrderStatus) -> &str {
        self.status_texts
            .get(&(language, status))
            .map(String::as_str)
            .unwrap_or(language.locale().generic_status)
    }

    /// Full status message: the status text followed by the order summary.
    pub fn order_status_message(&self, language: Language, notice: &OrderStatusNotice) -> String {
        let locale = language.locale();
        format!(
            "{}\n\n<b>{}:</b> #{}\n<b>{}:</b> {}\n<b>{}:</b> {}",
            escape_html(self.status_text(language, notice.current)),
            locale.order_label,
            notice.order_id,
            locale.date_label,
            format_date(language, notice.created_at),
            locale.total_label,
            format_money(language, notice.total_price),
        )
    }

    /// Admin alert for a product at or below the low-stock threshold.
    pub fn low_stock_message(&self, language: Language, notice: &LowStockNotice) -> String {
        let locale = language.locale();
        format!(
            "<b>{}</b>\n{}: {}\n{}: {}\n{}: {}\n{}: {} {}",
            locale.low_stock_title,
            locale.category_label,
            escape_html(&notice.category_name),
            locale.product_type_label,
            escape_html(notice.product_type_name.as_deref().unwrap_or("-")),
            locale.product_label,
            escape_html(&notice.product_name),
            locale.remaining_label,
            format_quantity(language, notice.remaining),
            escape_html(&notice.unit_label),
        )
    }
}

/// Formats a date in the language's convention (times are UTC).
pub fn format_date(language: Language, at: DateTime<Utc>) -> String {
    at.format(language.locale().date_format).to_string()
}

/// Formats an amount with grouped thousands, two decimals and the currency label.
pub fn format_money(language: Language, amount: Money) -> String {
    let locale = language.locale();
    let rendered = format!("{:.2}", amount.amount().round_dp(2));
    let (whole, fraction) = rendered.split_once('.').unwrap_or((rendered.as_str(), "00"));
    let (sign, digits) = match whole.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", whole),
    };

    format!(
        "{sign}{}{}{fraction} {}",
        group_thousands(digits, locale.thousands_separator),
        locale.decimal_separator,
        locale.currency
    )
}

/// Formats a quantity with the language's decimal separator.
pub fn format_quantity(language: Language, quantity: Quantity) -> String {
    quantity
        .to_string()
        .replace('.', &language.locale().decimal_separator.to_string())
}

fn group_thousands(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(digit);
    }
    grouped
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
