use crate::types::{Article, ChatMessage};

/// Separator the model is asked to put between thread posts.
pub const THREAD_DELIMITER: &str = "---";

/// Builds the system + user prompt pairs sent to the language model.
pub struct PromptManager;

impl PromptManager {
    pub fn single_post(article: &Article) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(
                "You write social media posts about news articles. \
                 Write one engaging post that invites discussion:\n\
                 1. Open with a thought-provoking question or claim\n\
                 2. Use at most 2-3 relevant hashtags\n\
                 3. Use emojis sparingly\n\
                 4. Stay under 280 characters including the link",
            ),
            ChatMessage::user(format!(
                "Article Title: {}\n\nArticle Content: {}\n\nURL: {}\n\n\
                 Write a post about this article. Include the URL.",
                article.title, article.content, article.url
            )),
        ]
    }

    pub fn thread(article: &Article) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(format!(
                "You turn articles into informative threads of short posts:\n\
                 1. Start with a strong hook\n\
                 2. Break complex ideas into digestible parts\n\
                 3. Use clear transitions between posts\n\
                 4. Include relevant data points and insights\n\
                 5. End with a thought-provoking conclusion\n\n\
                 Put a line containing only '{}' between posts. \
                 Keep each post under 280 characters.",
                THREAD_DELIMITER
            )),
            ChatMessage::user(format!(
                "Article Title: {}\n\nArticle Content: {}\n\nURL: {}\n\n\
                 Write a thread that breaks down this article. \
                 The first post must include the URL. End with a call to action.",
                article.title, article.content, article.url
            )),
        ]
    }
}
