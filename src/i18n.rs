// =============================================================================
// User-facing labels and messages
// =============================================================================

use crate::types::Locale;

/// Every piece of text the dashboard shows to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    KlineLoadFailed,
    OrderBookLoadFailed,
    IndicatorLoadFailed,
    NoData,
    InvalidOrderBook,
    NoAsks,
    NoBids,
    NoMidPrice,
    MidPrice,
    Spread,
    Price,
    Amount,
    Total,
    Time,
    Values,
    Date,
    Open,
    High,
    Low,
    Close,
    ContainerNotFound,
    ConfigNotFound,
}

pub fn text(locale: Locale, msg: Msg) -> &'static str {
    match locale {
        Locale::En => en(msg),
        Locale::Ru => ru(msg),
    }
}

fn en(msg: Msg) -> &'static str {
    match msg {
        Msg::KlineLoadFailed => "Failed to load chart data",
        Msg::OrderBookLoadFailed => "Failed to load order book",
        Msg::IndicatorLoadFailed => "Failed to load indicator data",
        Msg::NoData => "No data to display",
        Msg::InvalidOrderBook => "Invalid order book data.",
        Msg::NoAsks => "No ask data",
        Msg::NoBids => "No bid data",
        Msg::NoMidPrice => "No data to compute mid price",
        Msg::MidPrice => "Mid price",
        Msg::Spread => "Spread",
        Msg::Price => "Price",
        Msg::Amount => "Amount",
        Msg::Total => "Total",
        Msg::Time => "Time",
        Msg::Values => "Values",
        Msg::Date => "Date",
        Msg::Open => "Open",
        Msg::High => "High",
        Msg::Low => "Low",
        Msg::Close => "Close",
        Msg::ContainerNotFound => "Container not found",
        Msg::ConfigNotFound => "Configuration element not found",
    }
}

fn ru(msg: Msg) -> &'static str {
    match msg {
        Msg::KlineLoadFailed => "Не удалось загрузить данные графика",
        Msg::OrderBookLoadFailed => "Не удалось загрузить стакан",
        Msg::IndicatorLoadFailed => "Не удалось загрузить данные индикаторов",
        Msg::NoData => "Нет данных для отображения",
        Msg::InvalidOrderBook => "Некорректные данные стакана.",
        Msg::NoAsks => "Нет данных продаж",
        Msg::NoBids => "Нет данных покупок",
        Msg::NoMidPrice => "Нет данных для расчета средней цены",
        Msg::MidPrice => "Средняя цена",
        Msg::Spread => "Spread",
        Msg::Price => "Цена",
        Msg::Amount => "Объем",
        Msg::Total => "Всего",
        Msg::Time => "Время",
        Msg::Values => "Значения",
        Msg::Date => "Дата",
        Msg::Open => "Откр",
        Msg::High => "Макс",
        Msg::Low => "Мин",
        Msg::Close => "Закр",
        Msg::ContainerNotFound => "Контейнер не найден",
        Msg::ConfigNotFound => "Элемент конфигурации не найден",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_locales_cover_labels() {
        assert_eq!(text(Locale::En, Msg::Price), "Price");
        assert_eq!(text(Locale::Ru, Msg::Price), "Цена");
        assert_eq!(text(Locale::Ru, Msg::NoData), "Нет данных для отображения");
    }
}
