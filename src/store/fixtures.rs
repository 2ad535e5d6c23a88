//! Mock conversations for local development against the mobile client.

use chrono::{ DateTime, Duration, Utc };
use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::chat::{ Chat, Message, MessageContent, Role, UserProfile };

const EXCHANGES_PER_CHAT: i64 = 5;
const MAX_IMAGES_PER_MESSAGE: usize = 3;

const IMAGE_POOL: [&str; 4] = [
    "https://static.vecteezy.com/system/resources/thumbnails/036/324/708/small/ai-generated-picture-of-a-tiger-walking-in-the-forest-photo.jpg",
    "https://images.ctfassets.net/hrltx12pl8hq/28ECAQiPJZ78hxatLTa7Ts/2f695d869736ae3b0de3e56ceaca3958/free-nature-images.jpg?fit=fill&w=1200&h=630",
    "https://static.wixstatic.com/media/aa8751_0e2a1faaf9b241e0a9c988fb02987757~mv2.jpg/v1/crop/x_0,y_24,w_1080,h_1033/fill/w_256,h_256,al_c,q_80,usm_0.66_1.00_0.01,enc_avif,quality_auto/451833026_302026266270726_333130077128278713_n.jpg",
    "https://pbs.twimg.com/profile_images/632568635970576384/uTvv9oXs_400x400.jpg",
];

pub fn seeded_profile() -> UserProfile {
    UserProfile {
        name: Some("John Doe".to_string()),
        bio: Some("Just a test user.".to_string()),
    }
}

fn random_images<R: Rng>(rng: &mut R) -> Vec<MessageContent> {
    let mut pool = IMAGE_POOL.to_vec();
    pool.shuffle(rng);
    let count = rng.random_range(0..=MAX_IMAGES_PER_MESSAGE);
    pool.into_iter()
        .take(count)
        .map(|url| MessageContent::Image(url.to_string()))
        .collect()
}

fn fixture_message<R: Rng>(
    rng: &mut R,
    id: String,
    role: Role,
    text: String,
    created_at: DateTime<Utc>
) -> Message {
    let mut parts = vec![MessageContent::Text(text)];
    parts.extend(random_images(rng));
    Message::from_content(id, role, parts, created_at)
}

/// Generates `count` chats named `Mock Chat <i>`, each holding five
/// question/answer pairs one minute apart, replies 30 seconds after their
/// question. The last pair is stamped at the current time.
pub fn generate_chats<R: Rng>(count: usize, rng: &mut R) -> Vec<Chat> {
    let now = Utc::now();
    (1..=count)
        .map(|i| {
            let mut messages = Vec::with_capacity((EXCHANGES_PER_CHAT * 2) as usize);
            for j in 1..=EXCHANGES_PER_CHAT {
                let asked_at = now - Duration::minutes(EXCHANGES_PER_CHAT - j);
                messages.push(
                    fixture_message(
                        rng,
                        format!("msg-{}-{}-user", i, j),
                        Role::User,
                        format!("User message {} in Chat {}", j, i),
                        asked_at
                    )
                );
                messages.push(
                    fixture_message(
                        rng,
                        format!("msg-{}-{}-assistant", i, j),
                        Role::Assistant,
                        format!("Assistant reply {} in Chat {}", j, i),
                        asked_at + Duration::seconds(30)
                    )
                );
            }

            Chat {
                id: format!("chat-{}", i),
                name: format!("Mock Chat {}", i),
                created_at: now,
                messages,
            }
        })
        .collect()
}
