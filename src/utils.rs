use crate::error::CoreError;
use chrono::{DateTime, FixedOffset};
use curl::easy::Easy;
use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::time::Duration;
use xz2::read::XzDecoder;

/// Per spec: 30s for HEAD existence probes, a larger implementation-defined
/// bound for full body downloads.
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

pub fn download_xz(url: &str) -> Result<Vec<String>, CoreError> {
    let content = download_raw(url)?;
    log::debug!("[download_xz] len: {}", content.len());

    let mut decoder = XzDecoder::new(Cursor::new(content));
    let mut data = String::new();
    decoder.read_to_string(&mut data)?;

    Ok(data.split('\n').map(|l| l.to_string()).collect())
}

pub fn download_gz(url: &str) -> Result<Vec<String>, CoreError> {
    let content = download_raw(url)?;
    let mut decoder = GzDecoder::new(Cursor::new(content));
    let mut data = String::new();
    decoder.read_to_string(&mut data)?;

    Ok(data.split('\n').map(|l| l.to_string()).collect())
}

pub fn download_raw(url: &str) -> Result<Vec<u8>, CoreError> {
    let mut easy = Easy::new();

    easy.url(url).map_err(|e| CoreError::Network {
        url: url.to_string(),
        source: e,
    })?;
    easy.ssl_verify_peer(true).ok();
    easy.ssl_verify_host(true).ok();
    easy.follow_location(true).ok();
    easy.max_redirections(5).ok();
    easy.connect_timeout(CONNECT_TIMEOUT).ok();
    easy.timeout(DOWNLOAD_TIMEOUT).ok();

    let mut content = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| {
                content.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(|e| CoreError::Network {
                url: url.to_string(),
                source: e,
            })?;

        transfer.perform().map_err(|e| CoreError::Network {
            url: url.to_string(),
            source: e,
        })?;
    }

    Ok(content)
}

/// Probes `url` for existence with a `HEAD` request (`nobody(true)`), under
/// a short timeout. Used to pick a reachable index candidate without
/// pulling its full body.
pub fn probe_exists(url: &str) -> Result<bool, CoreError> {
    let mut easy = Easy::new();

    easy.url(url).map_err(|e| CoreError::Network {
        url: url.to_string(),
        source: e,
    })?;
    easy.nobody(true).map_err(|e| CoreError::Network {
        url: url.to_string(),
        source: e,
    })?;
    easy.ssl_verify_peer(true).ok();
    easy.ssl_verify_host(true).ok();
    easy.follow_location(true).ok();
    easy.max_redirections(5).ok();
    easy.connect_timeout(CONNECT_TIMEOUT).ok();
    easy.timeout(PROBE_TIMEOUT).ok();

    easy.perform().map_err(|e| CoreError::Network {
        url: url.to_string(),
        source: e,
    })?;

    let code = easy.response_code().map_err(|e| CoreError::Network {
        url: url.to_string(),
        source: e,
    })?;

    Ok((200..300).contains(&code))
}

/// Downloads `url` straight to `destination`, overwriting any existing file.
pub fn download_to_file(url: &str, destination: &Path) -> Result<(), CoreError> {
    let content = download_raw(url)?;
    let mut file = std::fs::File::create(destination)?;
    file.write_all(&content)?;
    Ok(())
}

pub fn download(url: &str) -> Result<Vec<String>, CoreError> {
    let content = download_raw(url)?;
    let content = String::from_utf8_lossy(&content).to_string();
    Ok(content.split('\n').map(|l| l.to_string()).collect())
}

pub fn parse_metadata(content: Vec<String>) -> Result<Vec<HashMap<String, Vec<String>>>, CoreError> {
    let mut data = Vec::new();
    let mut stanza = HashMap::new();

    let mut key: String = String::from("");
    let mut value: Vec<String> = Vec::new();

    for line in content.into_iter() {
        if line.trim().is_empty() {
            if !value.is_empty() {
                stanza.insert(key.clone(), value);
                value = Vec::new();
            }
            if !stanza.is_empty() {
                data.push(stanza);
            }

            stanza = HashMap::new();

            continue;
        }

        if line.starts_with(' ') {
            value.push(line);
        } else {
            if !value.is_empty() {
                stanza.insert(key, value);
                value = Vec::new();
            }

            match line.split_once(':') {
                None => {
                    log::debug!("[parse_metadata] invalid line, missing key: {}", line);
                    key = String::from("")
                }
                Some((k, v)) => {
                    key = String::from(k);
                    value.push(String::from(v));
                }
            }
        }
    }

    if !value.is_empty() {
        stanza.insert(key, value);
    }
    if !stanza.is_empty() {
        data.push(stanza);
    }

    Ok(data)
}

pub fn stanza_value(key: &str, stanza: &HashMap<String, Vec<String>>) -> Result<String, CoreError> {
    let value = stanza
        .get(key)
        .ok_or_else(|| CoreError::DependencyParse(format!("[stanza_value] {} not found!", key)))?;
    Ok(value[0].trim().to_string())
}

pub fn stanza_opt_value(key: &str, stanza: &HashMap<String, Vec<String>>) -> Option<String> {
    stanza_value(key, stanza).ok()
}

pub fn stanza_list(key: &str, stanza: &HashMap<String, Vec<String>>) -> Result<Vec<String>, CoreError> {
    let values = stanza
        .get(key)
        .ok_or_else(|| CoreError::DependencyParse(format!("[stanza_list] {} not found!", key)))?;
    let values = &values[0];
    Ok(values
        .split(' ')
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect())
}

pub fn stanza_opt_list(key: &str, stanza: &HashMap<String, Vec<String>>) -> Option<Vec<String>> {
    let list = stanza_list(key, stanza).ok()?;
    if list.is_empty() {
        None
    } else {
        Some(list)
    }
}

pub fn stanza_text(key: &str, stanza: &HashMap<String, Vec<String>>) -> Result<String, CoreError> {
    let values = stanza
        .get(key)
        .ok_or_else(|| CoreError::DependencyParse(format!("[stanza_text] {} not found!", key)))?;
    let values: Vec<&str> = values.iter().map(|l| l.trim()).collect();
    Ok(values.join("\n"))
}

pub fn stanza_opt_text(key: &str, stanza: &HashMap<String, Vec<String>>) -> Option<String> {
    stanza_text(key, stanza).ok()
}

pub fn stanza_date(key: &str, stanza: &HashMap<String, Vec<String>>) -> Option<DateTime<FixedOffset>> {
    let value = stanza_value(key, stanza).ok()?;
    match DateTime::parse_from_rfc2822(&value) {
        Ok(date) => Some(date),
        Err(e) => {
            log::error!("[stanza_date] parse error: {}", e);
            None
        }
    }
}

pub fn stanza_lines(
    key: &str,
    stanza: &HashMap<String, Vec<String>>,
    filter_empty: bool,
) -> Result<Vec<String>, CoreError> {
    let values = stanza
        .get(key)
        .ok_or_else(|| CoreError::DependencyParse(format!("[stanza_lines] {} not found!", key)))?;

    let values = values.iter().map(|l| l.trim().to_string());
    Ok(if filter_empty {
        values.filter(|l| !l.is_empty()).collect()
    } else {
        values.collect()
    })
}

#[derive(Debug, Clone)]
pub struct IndexFile {
    pub hash: String,
    pub size: u64,
    pub path: String,
}

pub fn stanza_files(key: &str, stanza: &HashMap<String, Vec<String>>) -> Result<Vec<IndexFile>, CoreError> {
    let lines = stanza_lines(key, stanza, true)?;

    let mut files = Vec::new();
    for l in lines.into_iter() {
        let parts: Vec<&str> = l.split(' ').map(|v| v.trim()).filter(|v| !v.is_empty()).collect();

        if parts.len() != 3 {
            return Err(CoreError::DependencyParse(format!(
                "[stanza_files] invalid file, wrong number of elements: {}",
                l
            )));
        }

        let size = parts[1]
            .parse::<u64>()
            .map_err(|e| CoreError::DependencyParse(e.to_string()))?;

        files.push(IndexFile {
            hash: parts[0].to_string(),
            size,
            path: parts[2].to_string(),
        });
    }

    Ok(files)
}

pub fn stanza_opt_files(key: &str, stanza: &HashMap<String, Vec<String>>) -> Option<Vec<IndexFile>> {
    let files = stanza_files(key, stanza).ok()?;
    if files.is_empty() {
        None
    } else {
        Some(files)
    }
}

/// Joins a `Filename` field against a repository base URL; a value that is
/// already absolute is returned unchanged.
pub fn join_url(base_url: &str, filename: &str) -> String {
    if filename.starts_with("http://") || filename.starts_with("https://") {
        return filename.to_string();
    }
    format!("{}/{}", base_url.trim_end_matches('/'), filename.trim_start_matches('/'))
}

/// The URL prefix up to and including the first `/pool/` segment, used to
/// decide whether two packages came from the same repository.
pub fn repo_base(url: &str) -> Option<&str> {
    let idx = url.find("/pool/")?;
    Some(&url[..idx + "/pool/".len()])
}

pub fn basename(url: &str) -> String {
    url.rsplit('/').next().unwrap_or(url).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_metadata_splits_on_blank_lines() {
        let content = vec![
            "Package: a".to_string(),
            "Version: 1.0".to_string(),
            "".to_string(),
            "Package: b".to_string(),
            "Version: 2.0".to_string(),
        ];
        let stanzas = parse_metadata(content).unwrap();
        assert_eq!(stanzas.len(), 2);
        assert_eq!(stanzas[0].get("Package").unwrap()[0], " a");
        assert_eq!(stanzas[1].get("Package").unwrap()[0], " b");
    }

    #[test]
    fn repo_base_matches_up_to_pool() {
        let url = "http://archive.ubuntu.com/ubuntu/pool/main/a/acct/acct_6.6.4-5_amd64.deb";
        assert_eq!(
            repo_base(url),
            Some("http://archive.ubuntu.com/ubuntu/pool/")
        );
    }

    #[test]
    fn repo_base_none_without_pool() {
        assert_eq!(repo_base("http://example.com/acct.deb"), None);
    }

    #[test]
    fn join_url_preserves_absolute() {
        assert_eq!(
            join_url("http://example.com/ubuntu", "http://other.com/a.deb"),
            "http://other.com/a.deb"
        );
        assert_eq!(
            join_url("http://example.com/ubuntu", "pool/main/a.deb"),
            "http://example.com/ubuntu/pool/main/a.deb"
        );
    }

    #[test]
    fn basename_strips_path() {
        assert_eq!(basename("http://x/y/z/acct_1.0_amd64.deb"), "acct_1.0_amd64.deb");
    }
}
