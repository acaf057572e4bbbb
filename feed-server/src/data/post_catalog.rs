use serde::Serialize;

/// Статический каталог постов ленты. Посты — внешний коллаборатор
/// подсистемы комментариев: хранятся не в базе, а в памяти процесса,
/// и используются только для проверки существования и отображения.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct PostEntry {
    pub(crate) id: &'static str,
    pub(crate) author: &'static str,
    pub(crate) title: &'static str,
    pub(crate) body: &'static str,
}

#[derive(Debug, Clone)]
pub(crate) struct PostCatalog {
    posts: Vec<PostEntry>,
}

impl PostCatalog {
    pub(crate) fn sample() -> Self {
        Self {
            posts: vec![
                PostEntry {
                    id: "p1",
                    author: "wanderlust_kate",
                    title: "Sunrise over the Dolomites",
                    body: "Three hours of switchbacks were worth every step.",
                },
                PostEntry {
                    id: "p2",
                    author: "devmike",
                    title: "My desk setup, 2025 edition",
                    body: "Finally swapped the second monitor for a wide one.",
                },
                PostEntry {
                    id: "p3",
                    author: "sourdough_sam",
                    title: "Crumb shot of today's bake",
                    body: "78% hydration, cold proofed for 18 hours.",
                },
                PostEntry {
                    id: "p4",
                    author: "wanderlust_kate",
                    title: "Night market in Taipei",
                    body: "If you only try one thing, make it the scallion pancake.",
                },
                PostEntry {
                    id: "p5",
                    author: "runner_jules",
                    title: "First marathon done",
                    body: "4:12. Legs are gone, spirit is intact.",
                },
                PostEntry {
                    id: "p6",
                    author: "devmike",
                    title: "Weekend project: mechanical keyboard",
                    body: "Lubed switches are a rabbit hole, consider yourself warned.",
                },
            ],
        }
    }

    pub(crate) fn contains(&self, post_id: &str) -> bool {
        self.posts.iter().any(|post| post.id == post_id)
    }

    pub(crate) fn all(&self) -> &[PostEntry] {
        &self.posts
    }
}

#[cfg(test)]
mod tests {
    use super::PostCatalog;

    #[test]
    fn sample_catalog_contains_known_post() {
        let catalog = PostCatalog::sample();
        assert!(catalog.contains("p1"));
        assert!(!catalog.contains("nope"));
    }

    #[test]
    fn sample_catalog_ids_are_unique() {
        let catalog = PostCatalog::sample();
        let mut ids: Vec<_> = catalog.all().iter().map(|post| post.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), catalog.all().len());
    }
}
