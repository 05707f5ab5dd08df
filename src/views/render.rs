use crate::models::{Direction, Quote, Watch};

fn fmt2(x: f64) -> String {
    format!("{:.2}", x)
}

/// `1234567` -> `1,234,567`
fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Text handed to the notification sink when a watch fires.
pub fn alert_message(watch: &Watch, quote: &Quote) -> String {
    let (icon, verb) = match watch.direction {
        Direction::Above => ("📈", "has reached its target price"),
        Direction::Below => ("📉", "has dropped to its target price"),
    };
    let volume = quote
        .volume
        .map(group_thousands)
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        "🚨 Price alert 🚨\n\n\
         {icon} {symbol} {verb}!\n\
         🎯 Target: {direction} ${target}\n\
         💰 Current: ${current}\n\
         📊 Volume: {volume}",
        symbol = watch.symbol,
        direction = watch.direction,
        target = fmt2(watch.target_price),
        current = fmt2(quote.price),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WatchId;

    #[test]
    fn groups_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn message_mentions_symbol_and_prices() {
        let watch = Watch {
            id: WatchId(3),
            owner: "u".into(),
            destination: "c".into(),
            symbol: "0005.HK".into(),
            target_price: 50.0,
            direction: Direction::Below,
            active: true,
            created_at: 0,
            last_checked_at: None,
            last_alerted_at: None,
            alert_count: 0,
        };
        let quote = Quote {
            symbol: "0005.HK".into(),
            price: 49.5,
            volume: None,
            observed_at: 0,
        };

        let text = alert_message(&watch, &quote);
        assert!(text.contains("0005.HK has dropped to its target price"));
        assert!(text.contains("below $50.00"));
        assert!(text.contains("$49.50"));
        assert!(text.contains("Volume: N/A"));
    }
}
