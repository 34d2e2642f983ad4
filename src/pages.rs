use crate::conversation::Conversation;

/// Conversations per rendered page.
pub const PAGE_SIZE: usize = 5;

/// One fixed-size slice of the conversation list.
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    /// 1-indexed.
    pub page_num: usize,
    pub total_pages: usize,
    pub conversations: &'a [Conversation],
}

/// `ceil(n / page_size)`, zero for an empty session.
pub fn total_pages(conversations: usize, page_size: usize) -> usize {
    conversations.div_ceil(page_size.max(1))
}

/// Split conversations into consecutive pages of `page_size`; the last
/// page holds the remainder. No conversations means no pages.
pub fn paginate(conversations: &[Conversation], page_size: usize) -> Vec<Page<'_>> {
    let total = total_pages(conversations.len(), page_size);
    conversations
        .chunks(page_size.max(1))
        .enumerate()
        .map(|(i, chunk)| Page {
            page_num: i + 1,
            total_pages: total,
            conversations: chunk,
        })
        .collect()
}

/// The page a conversation lands on, by its position in the session.
pub fn page_of(conversation_index: usize, page_size: usize) -> usize {
    conversation_index / page_size.max(1) + 1
}

pub fn page_filename(page_num: usize) -> String {
    format!("page-{page_num:03}.html")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversations(n: usize) -> Vec<Conversation> {
        (0..n)
            .map(|i| Conversation {
                user_text: format!("prompt {i}"),
                timestamp: format!("t{i}"),
                messages: Vec::new(),
                is_continuation: false,
            })
            .collect()
    }

    #[test]
    fn twelve_conversations_make_three_pages() {
        let all = conversations(12);
        let pages = paginate(&all, PAGE_SIZE);
        let sizes: Vec<usize> = pages.iter().map(|p| p.conversations.len()).collect();
        assert_eq!(sizes, vec![5, 5, 2]);
        assert!(pages.iter().all(|p| p.total_pages == 3));
        let nums: Vec<usize> = pages.iter().map(|p| p.page_num).collect();
        assert_eq!(nums, vec![1, 2, 3]);
        assert_eq!(pages[2].conversations[1].user_text, "prompt 11");
    }

    #[test]
    fn total_pages_is_ceiling() {
        for n in 0..=23 {
            let expected = if n == 0 { 0 } else { (n + PAGE_SIZE - 1) / PAGE_SIZE };
            assert_eq!(total_pages(n, PAGE_SIZE), expected, "n = {n}");
            assert_eq!(paginate(&conversations(n), PAGE_SIZE).len(), expected, "n = {n}");
        }
    }

    #[test]
    fn empty_session_has_no_pages() {
        assert!(paginate(&[], PAGE_SIZE).is_empty());
    }

    #[test]
    fn exact_multiple_has_full_last_page() {
        let all = conversations(10);
        let pages = paginate(&all, PAGE_SIZE);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].conversations.len(), 5);
    }

    #[test]
    fn page_of_matches_paginate() {
        assert_eq!(page_of(0, PAGE_SIZE), 1);
        assert_eq!(page_of(4, PAGE_SIZE), 1);
        assert_eq!(page_of(5, PAGE_SIZE), 2);
        assert_eq!(page_of(11, PAGE_SIZE), 3);
    }

    #[test]
    fn filenames_are_zero_padded() {
        assert_eq!(page_filename(1), "page-001.html");
        assert_eq!(page_filename(2), "page-002.html");
        assert_eq!(page_filename(123), "page-123.html");
    }
}
