//! Test fixtures for E2E testing with sample posts

/// A post to submit, mirroring the API request body
#[derive(Debug, Clone)]
pub struct TestPostFixture {
    pub brand_name: &'static str,
    pub topic: &'static str,
    pub tone: &'static str,
    pub brief: &'static str,
    pub target_audience: &'static str,
}

impl TestPostFixture {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "brand_name": self.brand_name,
            "topic": self.topic,
            "tone": self.tone,
            "brief": self.brief,
            "target_audience": self.target_audience,
        })
    }
}

pub const TEST_POSTS: &[TestPostFixture] = &[
    TestPostFixture {
        brand_name: "Northwind Coffee",
        topic: "Autumn seasonal menu",
        tone: "warm",
        brief: "Announce the pumpkin spice latte return",
        target_audience: "Young professionals",
    },
    TestPostFixture {
        brand_name: "Peak Outfitters",
        topic: "Winter hiking gear",
        tone: "adventurous",
        brief: "Highlight the new insulated jacket line",
        target_audience: "Outdoor enthusiasts",
    },
    TestPostFixture {
        brand_name: "Lumen Labs",
        topic: "Product launch",
        tone: "professional",
        brief: "Introduce the smart desk lamp",
        target_audience: "Remote workers",
    },
];
