use sha2::{Digest, Sha256};

/// Dedup key for a discovered URL.
///
/// SHA256 of the URL exactly as discovered. No normalization: two spellings of
/// the same page are two rows, and the store's uniqueness constraint on this
/// hash is what makes re-discovery idempotent.
pub fn url_hash(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

/// Dedup key for a job posting.
///
/// SHA256 over `source_url + title + company`. Distinct from [`url_hash`]
/// because one URL can carry different postings over time.
pub fn job_hash(source_url: &str, title: &str, company: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_url.as_bytes());
    hasher.update(title.as_bytes());
    hasher.update(company.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_hash_is_stable() {
        assert_eq!(
            url_hash("https://acme.com/careers"),
            url_hash("https://acme.com/careers")
        );
    }

    #[test]
    fn test_url_hash_is_not_normalized() {
        assert_ne!(
            url_hash("https://acme.com/careers"),
            url_hash("https://acme.com/careers/")
        );
    }

    #[test]
    fn test_known_digest() {
        // sha256("abc")
        assert_eq!(
            url_hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_job_hash_matches_concatenation() {
        assert_eq!(
            job_hash("https://acme.com/jobs/1", "Engineer", "Acme"),
            url_hash("https://acme.com/jobs/1EngineerAcme")
        );
    }

    #[test]
    fn test_job_hash_depends_on_every_part() {
        let base = job_hash("https://acme.com/jobs/1", "Engineer", "Acme");

        assert_ne!(base, job_hash("https://acme.com/jobs/2", "Engineer", "Acme"));
        assert_ne!(base, job_hash("https://acme.com/jobs/1", "Designer", "Acme"));
        assert_ne!(base, job_hash("https://acme.com/jobs/1", "Engineer", "Globex"));
    }

    #[test]
    fn test_hash_format() {
        let hash = job_hash("", "", "");

        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
