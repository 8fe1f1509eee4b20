use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

/// Acima deste número de entradas as escritas varrem as expiradas
pub const SWEEP_THRESHOLD: usize = 1000;

/// Intervalo padrão da limpeza periódica
pub const CLEANUP_INTERVAL_SECONDS: u64 = 60;

/// Cache chave/valor em memória com expiração por chave
///
/// Mesma semântica do cache Redis (`SET ... EX`, `GET`, `DEL`, `EXISTS`,
/// `EXPIRE`, `INCR`). Uma entrada expirada se comporta como ausente. Ela sai
/// do mapa na próxima leitura da chave, na varredura das escritas quando o
/// mapa passa de [`SWEEP_THRESHOLD`] ou na limpeza periódica.
#[derive(Debug, Clone, Default)]
pub struct CacheService {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |at| at <= now)
    }
}

fn expiry(seconds: Option<u64>) -> Option<DateTime<Utc>> {
    seconds.map(|s| Utc::now() + Duration::seconds(s as i64))
}

/// Remove a chave só se ainda estiver expirada sob o guard de escrita
fn remove_if_expired(entries: &mut HashMap<String, CacheEntry>, key: &str, now: DateTime<Utc>) -> bool {
    if entries.get(key).map_or(false, |entry| entry.is_expired(now)) {
        entries.remove(key);
        true
    } else {
        false
    }
}

/// Descarta entradas expiradas; devolve quantas saíram
fn sweep_expired(entries: &mut HashMap<String, CacheEntry>, now: DateTime<Utc>) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| !entry.is_expired(now));
    before - entries.len()
}

/// Varre só quando o mapa passou do limite
fn sweep_if_full(entries: &mut HashMap<String, CacheEntry>, now: DateTime<Utc>) {
    if entries.len() >= SWEEP_THRESHOLD {
        sweep_expired(entries, now);
    }
}

impl CacheService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grava um valor, opcionalmente com expiração em segundos
    pub async fn set(&self, key: &str, value: &str, expire: Option<u64>) -> bool {
        let mut entries = self.entries.write().await;
        sweep_if_full(&mut entries, Utc::now());
        entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: expiry(expire),
            },
        );
        true
    }

    /// Serializa para JSON antes de gravar
    pub async fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        expire: Option<u64>,
    ) -> Result<bool, serde_json::Error> {
        let json = serde_json::to_string(value)?;
        Ok(self.set(key, &json, expire).await)
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let now = Utc::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Expirada: remover, a menos que outra tarefa já tenha regravado
        remove_if_expired(&mut *self.entries.write().await, key, now);
        None
    }

    /// Lê e desserializa JSON; valores que não são JSON voltam como string
    pub async fn get_json(&self, key: &str) -> Option<Value> {
        let raw = self.get(key).await?;
        Some(serde_json::from_str(&raw).unwrap_or(Value::String(raw)))
    }

    /// Remove a chave; `true` se havia algo válido para remover
    pub async fn delete(&self, key: &str) -> bool {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        matches!(entries.remove(key), Some(entry) if !entry.is_expired(now))
    }

    pub async fn exists(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    /// Define a expiração de uma chave existente
    pub async fn expire(&self, key: &str, seconds: u64) -> bool {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.expires_at = expiry(Some(seconds));
                true
            }
            Some(_) => {
                entries.remove(key);
                false
            }
            None => false,
        }
    }

    /// Incrementa um contador inteiro
    ///
    /// Chaves ausentes ou expiradas começam em 0 e recebem `expire` como
    /// expiração. Chaves existentes mantêm a expiração atual. Um valor que
    /// não é inteiro é tratado como 0.
    pub async fn increment(&self, key: &str, expire: Option<u64>) -> i64 {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        sweep_if_full(&mut entries, now);

        let live = entries.get(key).filter(|entry| !entry.is_expired(now));
        let (current, expires_at) = match live {
            Some(entry) => (entry.value.parse::<i64>().unwrap_or(0), entry.expires_at),
            None => (0, expiry(expire)),
        };

        let next = current + 1;
        entries.insert(
            key.to_string(),
            CacheEntry {
                value: next.to_string(),
                expires_at,
            },
        );
        next
    }

    /// Número de entradas (incluindo expiradas ainda não removidas)
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remove todas as entradas expiradas
    pub async fn purge_expired(&self) -> usize {
        sweep_expired(&mut *self.entries.write().await, Utc::now())
    }

    /// Inicia a limpeza periódica das entradas expiradas
    pub fn start_cleanup(self, period: std::time::Duration) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);

            loop {
                interval.tick().await;

                let removed = self.purge_expired().await;
                if removed > 0 {
                    tracing::debug!("🧹 Cache: {} entradas expiradas removidas", removed);
                }
            }
        });

        tracing::info!("🕐 Limpeza do cache iniciada: a cada {}s", period.as_secs());
    }
}
