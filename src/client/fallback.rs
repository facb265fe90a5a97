use crate::state::feed::{Entry, Feed};

const BARRAGE_DEFAULTS: &[&str] = &[
    "支持",
    "加油",
    "中日友好",
    "理性看待",
    "希望和平",
    "支持",
    "学到了",
    "加油",
    "支持",
];

const BULLETIN_DEFAULTS: &[&str] = &[
    "欢迎来到从日本看中国留言板。",
    "请文明发言，理性讨论。",
    "每分钟可以发布一条留言。",
];

/// Built-in display content used when a feed is empty or unreachable.
pub fn fallback_entries(feed: Feed) -> Vec<Entry> {
    let contents = match feed {
        Feed::Barrage => BARRAGE_DEFAULTS,
        Feed::Bulletin => BULLETIN_DEFAULTS,
    };

    contents
        .iter()
        .enumerate()
        .map(|(i, content)| Entry {
            id: format!("default-{}-{i}", feed.name()),
            content: content.to_string(),
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
        })
        .collect()
}
