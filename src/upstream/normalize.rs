/// Normalization of the upstream `level/full/info` response
///
/// Field mapping (upstream -> canonical):
///
/// | upstream                                        | canonical                         |
/// |-------------------------------------------------|-----------------------------------|
/// | `level_info.level_id`                           | `level.id` (request id if absent) |
/// | `level_info.level_name`                         | `level.meta.name`                 |
/// | `level_info.desc`                               | `level.meta.description`          |
/// | `level_info.level_intro`                        | `level.meta.intro`                |
/// | `level_info.level_type`                         | `level.meta.type`                 |
/// | `level_info.level_category`                     | `level.meta.category` (mapped)    |
/// | `level_info.play_tags`                          | `level.meta.tags`                 |
/// | `level_info.limit_play_num_min` / `_max`        | `level.meta.players.min` / `max`  |
/// | `level_info.show_limit_play_num_str`            | `level.meta.players.str`          |
/// | `level_info.hot_score` / `good_rate`            | `level.meta.hotScore` / `goodRate`|
/// | `level_info.cover_image.url` + `images[].url`   | `level.meta.cover.images`         |
/// | `level_info.video_info.video_cover` / `_url`    | `level.meta.cover.videoCover` / `video` |
/// | `developer_news_response.latest_update`         | `level.version.latest` / `updateInfo` |
/// | `developer_news_response.update_list`           | `level.version.changelog`         |
/// | `developer.game_avatar` / `game_nickname`       | `author.game`                     |
/// | `developer.mys_user_info` (+ `developer.aid`)   | `author.mys`                      |
/// | `developer.hoyolab_user_info`                   | `author.hyl`                      |
///
/// Unknown fields are ignored and missing or null ones default, so schema
/// drift upstream degrades to empty values instead of failures.
use super::FetchError;
use crate::stage::{
    CanonicalStage, ChangelogEntry, Cover, GameIdentity, HylIdentity, Level, LevelMeta,
    LevelVersion, MysIdentity, Players, Region, StageAuthor,
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Placeholder avatar platform-A hands out for accounts without one
pub const MYS_PLACEHOLDER_AVATAR: &str =
    "https://bbs-static.miyoushe.com/upload/op_manual_upload/ugc_community/1769653604473developer_default_avatar.png";

/// Placeholder avatar platform-B hands out for accounts without one
pub const HYL_PLACEHOLDER_AVATAR: &str =
    "https://act-webstatic.hoyoverse.com/upload/op_manual_upload/ugc_community/developer_default_avatar.png";

/// Last entry of the author avatar fallback chain
pub const DEFAULT_AVATAR: &str = MYS_PLACEHOLDER_AVATAR;

/// Upstream category enum -> display category
const CATEGORY_LABELS: &[(&str, &str)] = &[("CASUAL", "轻量趣味"), ("LONG_TERM", "长线游玩")];

/// Map an upstream category value, passing unknown values through verbatim
pub fn map_category(raw: &str) -> String {
    CATEGORY_LABELS
        .iter()
        .find(|(key, _)| *key == raw)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Drop empty avatars and the platforms' known placeholder images
pub fn sanitize_avatar(avatar: Option<String>) -> Option<String> {
    avatar.filter(|url| {
        let url = url.trim();
        !url.is_empty() && url != MYS_PLACEHOLDER_AVATAR && url != HYL_PLACEHOLDER_AVATAR
    })
}

/// Top-level response envelope (also used for each sub-response)
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub retcode: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct FullInfoData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub resp_map: RespMap,
}

#[derive(Debug, Default, Deserialize)]
pub struct RespMap {
    pub level_detail: Option<Envelope<LevelDetailData>>,
    pub developer_info: Option<Envelope<DeveloperInfoData>>,
    pub config: Option<Envelope<Value>>,
}

#[derive(Debug, Deserialize)]
pub struct LevelDetailData {
    pub level_detail_response: Option<LevelDetailResponse>,
}

#[derive(Debug, Deserialize)]
pub struct LevelDetailResponse {
    pub level_info: Option<RawLevelInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawLevelInfo {
    #[serde(deserialize_with = "string_or_number")]
    pub level_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub level_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub desc: String,
    #[serde(deserialize_with = "null_as_default")]
    pub level_intro: String,
    #[serde(deserialize_with = "string_or_number")]
    pub level_type: String,
    #[serde(deserialize_with = "string_or_number")]
    pub level_category: String,
    #[serde(deserialize_with = "null_as_default")]
    pub play_tags: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub limit_play_num_min: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub limit_play_num_max: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub show_limit_play_num_str: String,
    #[serde(deserialize_with = "string_or_number")]
    pub hot_score: String,
    #[serde(deserialize_with = "string_or_number")]
    pub good_rate: String,
    pub cover_image: Option<RawImage>,
    #[serde(deserialize_with = "null_as_default")]
    pub images: Vec<RawImage>,
    pub video_info: Option<RawVideo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawImage {
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawVideo {
    pub video_cover: Option<String>,
    pub video_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeveloperInfoData {
    pub developer_news_response: Option<DeveloperNews>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeveloperNews {
    pub developer: Option<RawDeveloper>,
    pub latest_update: Option<RawUpdate>,
    #[serde(deserialize_with = "null_as_default")]
    pub update_list: Vec<RawUpdate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawDeveloper {
    #[serde(deserialize_with = "string_or_number")]
    pub aid: String,
    pub game_avatar: Option<String>,
    pub game_nickname: Option<String>,
    pub mys_user_info: Option<RawPlatformUser>,
    pub hoyolab_user_info: Option<RawPlatformUser>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawPlatformUser {
    #[serde(deserialize_with = "string_or_number")]
    pub aid: String,
    pub avatar_url: Option<String>,
    pub nickname: Option<String>,
    pub pendant: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawUpdate {
    #[serde(deserialize_with = "string_or_number")]
    pub version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub content: String,
}

/// Accept strings, numbers or null as a string field
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

/// Read an explicit null as the field's default value
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Treat "0" and empty account ids as absent
fn account_id(aid: &str) -> Option<String> {
    let aid = aid.trim();
    if aid.is_empty() || aid == "0" {
        None
    } else {
        Some(aid.to_string())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Normalize a decoded response envelope into a canonical stage
pub fn normalize_full_info(
    region: Region,
    stage_id: &str,
    envelope: Envelope<FullInfoData>,
) -> Result<CanonicalStage, FetchError> {
    if envelope.retcode != 0 {
        return Err(FetchError::Upstream(format!(
            "retcode {}: {}",
            envelope.retcode, envelope.message
        )));
    }
    let resp_map = envelope
        .data
        .map(|d| d.resp_map)
        .ok_or_else(|| FetchError::Upstream("response has no data".to_string()))?;

    let detail = resp_map
        .level_detail
        .ok_or_else(|| FetchError::Upstream("response has no level_detail".to_string()))?;
    if detail.retcode != 0 {
        return Err(FetchError::NotFound(format!(
            "{}/{}: retcode {}: {}",
            region, stage_id, detail.retcode, detail.message
        )));
    }
    let info = detail
        .data
        .and_then(|d| d.level_detail_response)
        .and_then(|r| r.level_info)
        .ok_or_else(|| FetchError::NotFound(format!("{}/{}: no level_info", region, stage_id)))?;

    let news = resp_map
        .developer_info
        .filter(|d| d.retcode == 0)
        .and_then(|d| d.data)
        .and_then(|d| d.developer_news_response)
        .unwrap_or_default();

    Ok(CanonicalStage {
        level: normalize_level(region, stage_id, info, &news),
        author: normalize_author(news.developer.unwrap_or_default()),
    })
}

fn normalize_level(region: Region, stage_id: &str, info: RawLevelInfo, news: &DeveloperNews) -> Level {
    let mut images: Vec<String> = info.cover_image.into_iter().map(|img| img.url).collect();
    images.extend(info.images.into_iter().map(|img| img.url));
    images.retain(|url| !url.is_empty());

    let video = info.video_info.unwrap_or_default();

    let id = if info.level_id.is_empty() {
        stage_id.to_string()
    } else {
        info.level_id
    };

    Level {
        id,
        region,
        meta: LevelMeta {
            name: info.level_name,
            description: info.desc,
            intro: info.level_intro,
            level_type: info.level_type,
            category: map_category(&info.level_category),
            tags: info.play_tags,
            players: Players {
                min: info.limit_play_num_min,
                max: info.limit_play_num_max,
                display_string: info.show_limit_play_num_str,
            },
            hot_score: info.hot_score,
            good_rate: info.good_rate,
            cover: Cover {
                images,
                video_cover: non_empty(video.video_cover),
                video: non_empty(video.video_url),
            },
        },
        version: LevelVersion {
            latest: news.latest_update.as_ref().map(|u| u.version.clone()),
            update_info: news.latest_update.as_ref().map(|u| u.content.clone()),
            changelog: news
                .update_list
                .iter()
                .map(|u| ChangelogEntry {
                    version: u.version.clone(),
                    content: u.content.clone(),
                })
                .collect(),
        },
    }
}

fn normalize_author(developer: RawDeveloper) -> StageAuthor {
    let mys = developer.mys_user_info.and_then(|user| {
        let aid = account_id(&user.aid).or_else(|| account_id(&developer.aid))?;
        Some(MysIdentity {
            aid,
            avatar: sanitize_avatar(user.avatar_url),
            name: non_empty(user.nickname),
        })
    });

    let hyl = developer.hoyolab_user_info.and_then(|user| {
        let aid = account_id(&user.aid)?;
        Some(HylIdentity {
            aid,
            avatar: sanitize_avatar(user.avatar_url),
            pendant: non_empty(user.pendant),
            name: non_empty(user.nickname),
        })
    });

    StageAuthor {
        game: GameIdentity {
            avatar: sanitize_avatar(developer.game_avatar),
            name: non_empty(developer.game_nickname),
        },
        mys,
        hyl,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// Representative upstream body for a platform-A authored stage
    pub(crate) fn sample_body() -> Value {
        json!({
            "retcode": 0,
            "message": "OK",
            "data": {
                "resp_map": {
                    "level_detail": {
                        "retcode": 0,
                        "message": "",
                        "data": {
                            "level_detail_response": {
                                "level_info": {
                                    "level_id": "1234567890",
                                    "level_name": "Sky Garden",
                                    "desc": "A garden in the sky",
                                    "level_intro": "Jump around\nand find the key",
                                    "level_type": "Parkour",
                                    "level_category": "CASUAL",
                                    "play_tags": ["parkour", "puzzle"],
                                    "limit_play_num_min": 1,
                                    "limit_play_num_max": 4,
                                    "show_limit_play_num_str": "1-4",
                                    "hot_score": 1532,
                                    "good_rate": "98%",
                                    "cover_image": { "url": "https://img.example/cover.png" },
                                    "images": [{ "url": "https://img.example/1.png" }],
                                    "video_info": { "video_cover": "", "video_url": "https://v.example/1.mp4" }
                                }
                            }
                        }
                    },
                    "developer_info": {
                        "retcode": 0,
                        "data": {
                            "developer_news_response": {
                                "developer": {
                                    "aid": 777,
                                    "game_avatar": "https://img.example/game.png",
                                    "game_nickname": "Traveler",
                                    "mys_user_info": {
                                        "avatar_url": MYS_PLACEHOLDER_AVATAR,
                                        "nickname": "mys_name"
                                    }
                                },
                                "latest_update": { "version": "1.2", "content": "New area" },
                                "update_list": [
                                    { "version": "1.2", "content": "New area" },
                                    { "version": "1.1", "content": "Bug fixes" }
                                ]
                            }
                        }
                    },
                    "config": { "retcode": 0, "data": {} }
                }
            }
        })
    }

    fn normalize(body: Value) -> Result<CanonicalStage, FetchError> {
        let envelope: Envelope<FullInfoData> = serde_json::from_value(body).unwrap();
        normalize_full_info(Region::CnGf01, "1234567890", envelope)
    }

    #[test]
    fn test_normalizes_level_fields() {
        let stage = normalize(sample_body()).unwrap();
        let meta = &stage.level.meta;

        assert_eq!(stage.level.id, "1234567890");
        assert_eq!(stage.level.region, Region::CnGf01);
        assert_eq!(meta.name, "Sky Garden");
        assert_eq!(meta.category, "轻量趣味");
        assert_eq!(meta.hot_score, "1532");
        assert_eq!(meta.good_rate, "98%");
        assert_eq!(meta.players.display_string, "1-4");
        assert_eq!(
            meta.cover.images,
            vec!["https://img.example/cover.png", "https://img.example/1.png"]
        );
        assert_eq!(meta.cover.video_cover, None);
        assert_eq!(stage.level.version.latest.as_deref(), Some("1.2"));
        assert_eq!(stage.level.version.changelog.len(), 2);
    }

    #[test]
    fn test_normalizes_author_and_sanitizes_placeholder() {
        let stage = normalize(sample_body()).unwrap();
        let mys = stage.author.mys.as_ref().unwrap();

        // aid falls back to developer.aid
        assert_eq!(mys.aid, "777");
        assert_eq!(mys.avatar, None);
        assert_eq!(mys.name.as_deref(), Some("mys_name"));
        assert_eq!(stage.author.game.name.as_deref(), Some("Traveler"));
        assert!(stage.author.hyl.is_none());
        assert_eq!(stage.author.uid().as_deref(), Some("m777"));
    }

    #[test]
    fn test_null_fields_default() {
        let mut body = sample_body();
        let info = &mut body["data"]["resp_map"]["level_detail"]["data"]["level_detail_response"]["level_info"];
        info["desc"] = Value::Null;
        info["play_tags"] = Value::Null;
        info["limit_play_num_min"] = Value::Null;
        info["limit_play_num_max"] = Value::Null;
        info["images"] = Value::Null;
        body["data"]["resp_map"]["developer_info"]["data"]["developer_news_response"]["update_list"] = Value::Null;

        let stage = normalize(body).unwrap();
        let meta = &stage.level.meta;

        assert_eq!(meta.name, "Sky Garden");
        assert_eq!(meta.description, "");
        assert!(meta.tags.is_empty());
        assert_eq!(meta.players.min, 0);
        assert_eq!(meta.players.max, 0);
        assert_eq!(meta.cover.images, vec!["https://img.example/cover.png"]);
        assert!(stage.level.version.changelog.is_empty());
    }

    #[test]
    fn test_category_passthrough() {
        assert_eq!(map_category("LONG_TERM"), "长线游玩");
        assert_eq!(map_category("SOMETHING_NEW"), "SOMETHING_NEW");
        assert_eq!(map_category(""), "");
    }

    #[test]
    fn test_sanitize_avatar() {
        assert_eq!(sanitize_avatar(Some(HYL_PLACEHOLDER_AVATAR.to_string())), None);
        assert_eq!(sanitize_avatar(Some(MYS_PLACEHOLDER_AVATAR.to_string())), None);
        assert_eq!(sanitize_avatar(Some(String::new())), None);
        assert_eq!(
            sanitize_avatar(Some("https://img.example/a.png".to_string())),
            Some("https://img.example/a.png".to_string())
        );
    }

    #[test]
    fn test_level_detail_failure_is_not_found() {
        let mut body = sample_body();
        body["data"]["resp_map"]["level_detail"] = json!({ "retcode": -1, "message": "level offline", "data": null });
        assert!(matches!(normalize(body), Err(FetchError::NotFound(_))));

        let mut body = sample_body();
        body["data"]["resp_map"]["level_detail"]["data"]["level_detail_response"] = json!({});
        assert!(matches!(normalize(body), Err(FetchError::NotFound(_))));
    }

    #[test]
    fn test_envelope_failure_is_upstream() {
        let body = json!({ "retcode": -100, "message": "busy", "data": null });
        assert!(matches!(normalize(body), Err(FetchError::Upstream(_))));
    }

    #[test]
    fn test_missing_developer_info_yields_empty_author() {
        let mut body = sample_body();
        body["data"]["resp_map"].as_object_mut().unwrap().remove("developer_info");
        let stage = normalize(body).unwrap();

        assert_eq!(stage.author, StageAuthor::default());
        assert_eq!(stage.author.uid(), None);
        assert_eq!(stage.level.version.latest, None);
    }

    #[test]
    fn test_hoyolab_author() {
        let mut body = sample_body();
        body["data"]["resp_map"]["developer_info"]["data"]["developer_news_response"]["developer"] = json!({
            "aid": 0,
            "game_nickname": "Lumine",
            "hoyolab_user_info": {
                "aid": "9001",
                "avatar_url": "https://img.example/hyl.png",
                "nickname": "hyl_name",
                "pendant": "https://img.example/pendant.png"
            }
        });
        let stage = normalize(body).unwrap();
        let hyl = stage.author.hyl.as_ref().unwrap();

        assert!(stage.author.mys.is_none());
        assert_eq!(hyl.pendant.as_deref(), Some("https://img.example/pendant.png"));
        assert_eq!(stage.author.uid().as_deref(), Some("h9001"));
    }
}
