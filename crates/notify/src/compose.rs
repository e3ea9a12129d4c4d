//! Confirmation message templates.
//!
//! Bodies are plain text in the service's house style. Booking times are
//! rendered with the UTC offset carried by the event itself, never the
//! server's local zone.

use chrono::{DateTime, Utc};

use mansei_core::booking::BookingEvent;
use mansei_core::quote::Quote;

// ---------------------------------------------------------------------------
// Company contact details
// ---------------------------------------------------------------------------

pub const COMPANY_NAME: &str = "電化のマンセイ";
pub const COMPANY_ADDRESS: &str = "〒270-2241 千葉県松戸市松戸新田24";
pub const COMPANY_PHONE: &str = "047-364-8112";
pub const COMPANY_HOURS: &str = "9:00〜18:00（土日祝休み）";
pub const LINE_URL: &str = "https://lin.ee/0OsWYCs";
pub const CONTACT_URL: &str = "https://d-mansei.co.jp/contact";

/// Staff inbox that receives a copy of every confirmation.
pub const ADMIN_EMAIL: &str = "info@d-mansei.co.jp";

const RULE_HEAVY: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
const RULE_LIGHT: &str = "─────────────────────────────────";

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format a yen amount with thousands separators: `format_yen(35500)` is
/// `"¥35,500"`.
pub fn format_yen(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-¥{grouped}")
    } else {
        format!("¥{grouped}")
    }
}

fn format_date(event: &BookingEvent) -> String {
    event.start_at.format("%Y/%m/%d").to_string()
}

fn format_time(event: &BookingEvent) -> String {
    event.start_at.format("%H:%M").to_string()
}

/// A UTC instant rendered in the event's own timezone offset.
fn format_local(instant: DateTime<Utc>, event: &BookingEvent) -> String {
    instant
        .with_timezone(event.start_at.offset())
        .format("%Y/%m/%d %H:%M")
        .to_string()
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// The 追加工事 lines: one per priced selection, or an explicit "none".
fn additional_items(quote: &Quote) -> String {
    let priced: Vec<_> = quote.answers.iter().filter(|a| a.price > 0).collect();
    if priced.is_empty() {
        return "追加工事：なし\n".to_string();
    }
    let mut details = String::from("追加工事・オプション：\n");
    for item in priced {
        details.push_str(&format!(
            "・{}：{} (税込)\n",
            item.option_label,
            format_yen(item.price)
        ));
    }
    details
}

fn estimate_section(quote: Option<&Quote>, event: &BookingEvent) -> String {
    match quote {
        Some(quote) => format!(
            "■ 見積り内容\n{RULE_LIGHT}\n\
             作成日時：{created}\n\n\
             基本取付工事費：{base} (税込)\n\n\
             {items}\n\
             合計金額：{total} (税込)\n{RULE_LIGHT}",
            created = format_local(quote.created_at, event),
            base = format_yen(quote.base_price),
            items = additional_items(quote),
            total = format_yen(quote.total_price),
        ),
        None => format!(
            "■ 見積り内容\n{RULE_LIGHT}\n\
             事前に見積りデータが作成されていません。\n\
             当日現地確認にて詳細をお見積りいたします。\n{RULE_LIGHT}"
        ),
    }
}

fn reservation_section(event: &BookingEvent) -> String {
    format!(
        "■ 予約情報\n{RULE_LIGHT}\n\
         予約ID：{id}\n\
         工事予定日：{date}\n\
         工事時間：{time}\n\
         予約完了日：{completed}\n{RULE_LIGHT}",
        id = event.booking_id,
        date = format_date(event),
        time = format_time(event),
        completed = format_local(Utc::now(), event),
    )
}

fn contact_section() -> String {
    format!(
        "■ お問い合わせ\n\
         {COMPANY_NAME}\n\
         {COMPANY_ADDRESS}\n\
         電話：{COMPANY_PHONE}\n\
         営業時間：{COMPANY_HOURS}\n\
         LINE：{LINE_URL}\n\
         メール：{CONTACT_URL}"
    )
}

fn body_footer() -> String {
    format!(
        "■ 今後の流れ\n\
         1. 工事日前日に担当者よりお電話でご連絡いたします\n\
         2. 当日は時間通りにお伺いいたします\n\
         3. 現地確認後、最終金額をご提示いたします\n\n\
         ■ ご注意事項\n\
         ・現地の状況により追加工事が必要な場合があります\n\
         ・悪天候の場合は日程を調整させていただく場合があります\n\n\
         {contact}\n\n\
         ご不明な点がございましたら、お気軽にお問い合わせください。\n\
         当日お会いできることを楽しみにしております。\n\n\
         {COMPANY_NAME} スタッフ一同\n\
         {RULE_HEAVY}",
        contact = contact_section(),
    )
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// A composed message ready for the outbound transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationEmail {
    pub subject: String,
    pub body: String,
}

/// Confirmation sent to the visitor who booked the slot.
pub fn customer_confirmation(quote: Option<&Quote>, event: &BookingEvent) -> ConfirmationEmail {
    let body = format!(
        "{RULE_HEAVY}\n\
         　エアコン取付工事　予約完了のお知らせ\n\
         {RULE_HEAVY}\n\n\
         {name} 様\n\n\
         この度は{COMPANY_NAME}にご予約をいただき、\n\
         誠にありがとうございます。\n\n\
         {estimate}\n\n\
         {reservation}\n\n\
         {footer}\n",
        name = event.attendee.name,
        estimate = estimate_section(quote, event),
        reservation = reservation_section(event),
        footer = body_footer(),
    );
    ConfirmationEmail {
        subject: "エアコン取付工事 予約完了のお知らせ".to_string(),
        body,
    }
}

/// Copy for the staff inbox: the customer's contact block followed by the
/// same work details.
pub fn admin_confirmation(quote: Option<&Quote>, event: &BookingEvent) -> ConfirmationEmail {
    let body = format!(
        "{RULE_HEAVY}\n\
         　新規予約のお知らせ\n\
         {RULE_HEAVY}\n\n\
         ■ 予約者情報\n{RULE_LIGHT}\n\
         名前：{name}\n\
         メール：{email}\n\
         電話：{phone}\n{RULE_LIGHT}\n\n\
         {estimate}\n\n\
         {reservation}\n",
        name = event.attendee.name,
        email = event.attendee.email,
        phone = event.attendee.phone.as_deref().unwrap_or("未設定"),
        estimate = estimate_section(quote, event),
        reservation = reservation_section(event),
    );
    ConfirmationEmail {
        subject: format!("【新規予約】{} {}", format_date(event), event.attendee.name),
        body,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use mansei_core::booking::Attendee;
    use mansei_core::quote::{Quote, ResolvedAnswer};

    fn event() -> BookingEvent {
        BookingEvent {
            booking_id: "bk_42".to_string(),
            event_type: "booking.created".to_string(),
            start_at: DateTime::parse_from_rfc3339("2025-07-01T10:00:00+09:00").unwrap(),
            end_at: DateTime::parse_from_rfc3339("2025-07-01T11:00:00+09:00").unwrap(),
            timezone: "Asia/Tokyo".to_string(),
            attendee: Attendee {
                name: "テスト花子".to_string(),
                email: "hanako@example.com".to_string(),
                phone: Some("090-1234-5678".to_string()),
            },
            created_at: None,
            updated_at: None,
            cancellation: None,
        }
    }

    fn quote() -> Quote {
        Quote::new(
            vec![
                ResolvedAnswer {
                    question_id: "plan-selection".into(),
                    selected_option: 0,
                    option_label: "取付工事のみ（本体はお持ちの方）".into(),
                    price: 0,
                },
                ResolvedAnswer {
                    question_id: "outdoor-unit-location".into(),
                    selected_option: 1,
                    option_label: "1階に降ろす".into(),
                    price: 11_000,
                },
                ResolvedAnswer {
                    question_id: "removal-needed".into(),
                    selected_option: 0,
                    option_label: "必要（回収・処分込み）".into(),
                    price: 5_500,
                },
            ],
            19_000,
            35_500,
        )
    }

    // -- format_yen --

    #[test]
    fn yen_formatting_groups_thousands() {
        assert_eq!(format_yen(0), "¥0");
        assert_eq!(format_yen(500), "¥500");
        assert_eq!(format_yen(5_500), "¥5,500");
        assert_eq!(format_yen(35_500), "¥35,500");
        assert_eq!(format_yen(199_999), "¥199,999");
        assert_eq!(format_yen(1_234_567), "¥1,234,567");
    }

    // -- customer message --

    #[test]
    fn customer_body_lists_priced_selections_and_total() {
        let mail = customer_confirmation(Some(&quote()), &event());
        assert!(mail.body.contains("テスト花子 様"));
        assert!(mail.body.contains("基本取付工事費：¥19,000 (税込)"));
        assert!(mail.body.contains("・1階に降ろす：¥11,000 (税込)"));
        assert!(mail.body.contains("・必要（回収・処分込み）：¥5,500 (税込)"));
        assert!(!mail.body.contains("取付工事のみ"));
        assert!(mail.body.contains("合計金額：¥35,500 (税込)"));
    }

    #[test]
    fn booking_time_is_rendered_in_event_timezone() {
        let mail = customer_confirmation(Some(&quote()), &event());
        // 10:00+09:00 must stay 10:00, not shift to the server's zone.
        assert!(mail.body.contains("工事予定日：2025/07/01"));
        assert!(mail.body.contains("工事時間：10:00"));
        assert!(mail.body.contains("予約ID：bk_42"));
    }

    #[test]
    fn missing_quote_renders_onsite_estimate_notice() {
        let mail = customer_confirmation(None, &event());
        assert!(mail.body.contains("事前に見積りデータが作成されていません。"));
        assert!(!mail.body.contains("合計金額"));
    }

    #[test]
    fn quote_without_paid_options_says_none() {
        let bare = Quote::new(vec![], 19_000, 19_000);
        let mail = customer_confirmation(Some(&bare), &event());
        assert!(mail.body.contains("追加工事：なし"));
    }

    #[test]
    fn contact_block_is_always_present() {
        let mail = customer_confirmation(None, &event());
        assert!(mail.body.contains(COMPANY_NAME));
        assert!(mail.body.contains(COMPANY_PHONE));
        assert!(mail.body.contains(LINE_URL));
    }

    // -- admin message --

    #[test]
    fn admin_body_leads_with_customer_details() {
        let mail = admin_confirmation(Some(&quote()), &event());
        assert!(mail.body.contains("名前：テスト花子"));
        assert!(mail.body.contains("メール：hanako@example.com"));
        assert!(mail.body.contains("電話：090-1234-5678"));
        assert!(mail.subject.contains("2025/07/01"));
    }

    #[test]
    fn admin_body_shows_placeholder_for_missing_phone() {
        let mut e = event();
        e.attendee.phone = None;
        let mail = admin_confirmation(None, &e);
        assert!(mail.body.contains("電話：未設定"));
    }
}
