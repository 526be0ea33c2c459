use crate::shared::errors::{AppError, AppResult};
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// 暗号化されたデータ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedData {
    /// 暗号化されたデータ（Base64エンコード）
    pub ciphertext: String,
    /// ナンス（Base64エンコード）
    pub nonce: String,
    /// 暗号化アルゴリズム
    pub algorithm: String,
}

/// トークン暗号化サービス
#[derive(Clone)]
pub struct TokenEncryption {
    /// 暗号化キー
    encryption_key: Vec<u8>,
}

impl TokenEncryption {
    /// 新しいTokenEncryptionを作成する
    ///
    /// # 引数
    /// * `key` - 暗号化キー（32バイト）
    ///
    /// # 戻り値
    /// TokenEncryptionインスタンス
    pub fn new(key: &str) -> Self {
        // キーを32バイトに調整
        let mut key_bytes = key.as_bytes().to_vec();
        key_bytes.resize(32, 0); // 32バイトに調整（不足分は0で埋める）

        Self {
            encryption_key: key_bytes,
        }
    }

    /// データを暗号化する
    ///
    /// # 引数
    /// * `plaintext` - 暗号化するデータ
    ///
    /// # 戻り値
    /// 暗号化されたデータ
    pub fn encrypt(&self, plaintext: &str) -> AppResult<EncryptedData> {
        let cipher = Aes256Gcm::new_from_slice(&self.encryption_key)
            .map_err(|e| AppError::security(format!("キー生成エラー: {e}")))?;

        // ランダムなナンス（12バイト）を生成
        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        // データを暗号化
        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| AppError::security(format!("暗号化エラー: {e}")))?;

        // Base64エンコード
        let ciphertext_b64 = general_purpose::STANDARD.encode(&ciphertext);
        let nonce_b64 = general_purpose::STANDARD.encode(nonce_bytes);

        Ok(EncryptedData {
            ciphertext: ciphertext_b64,
            nonce: nonce_b64,
            algorithm: "AES-256-GCM".to_string(),
        })
    }

    /// データを復号化する
    ///
    /// # 引数
    /// * `encrypted_data` - 暗号化されたデータ
    ///
    /// # 戻り値
    /// 復号化されたデータ
    pub fn decrypt(&self, encrypted_data: &EncryptedData) -> AppResult<String> {
        // アルゴリズムを確認
        if encrypted_data.algorithm != "AES-256-GCM" {
            return Err(AppError::security(format!(
                "サポートされていないアルゴリズム: {}",
                encrypted_data.algorithm
            )));
        }

        let cipher = Aes256Gcm::new_from_slice(&self.encryption_key)
            .map_err(|e| AppError::security(format!("キー生成エラー: {e}")))?;

        // Base64デコード
        let ciphertext = general_purpose::STANDARD
            .decode(&encrypted_data.ciphertext)
            .map_err(|e| AppError::security(format!("暗号文デコードエラー: {e}")))?;

        let nonce_bytes = general_purpose::STANDARD
            .decode(&encrypted_data.nonce)
            .map_err(|e| AppError::security(format!("ナンスデコードエラー: {e}")))?;

        if nonce_bytes.len() != 12 {
            return Err(AppError::security("ナンスのサイズが正しくありません"));
        }

        let nonce = Nonce::from_slice(&nonce_bytes);

        // 復号化
        let plaintext = cipher
            .decrypt(nonce, ciphertext.as_ref())
            .map_err(|e| AppError::security(format!("復号化エラー: {e}")))?;

        String::from_utf8(plaintext)
            .map_err(|e| AppError::security(format!("UTF-8変換エラー: {e}")))
    }

    /// トークンを暗号化してBase64文字列として返す
    ///
    /// # 引数
    /// * `token` - 暗号化するトークン
    ///
    /// # 戻り値
    /// Base64エンコードされた暗号化トークン
    pub fn encrypt_token(&self, token: &str) -> AppResult<String> {
        let encrypted_data = self.encrypt(token)?;

        // JSON形式でシリアライズしてBase64エンコード
        let json_data = serde_json::to_string(&encrypted_data)?;

        Ok(general_purpose::STANDARD.encode(json_data.as_bytes()))
    }

    /// Base64文字列からトークンを復号化する
    ///
    /// # 引数
    /// * `encrypted_token` - Base64エンコードされた暗号化トークン
    ///
    /// # 戻り値
    /// 復号化されたトークン
    pub fn decrypt_token(&self, encrypted_token: &str) -> AppResult<String> {
        // Base64デコード
        let json_bytes = general_purpose::STANDARD
            .decode(encrypted_token)
            .map_err(|e| AppError::security(format!("Base64デコードエラー: {e}")))?;

        let json_data = String::from_utf8(json_bytes)
            .map_err(|e| AppError::security(format!("UTF-8変換エラー: {e}")))?;

        // JSONデシリアライズ
        let encrypted_data: EncryptedData = serde_json::from_str(&json_data)?;

        self.decrypt(&encrypted_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_encryption() -> TokenEncryption {
        TokenEncryption::new("test_encryption_key_32_bytes_long")
    }

    #[test]
    fn test_encrypt_decrypt() {
        let encryption = setup_test_encryption();
        let plaintext = "test_token_data";

        let encrypted_data = encryption.encrypt(plaintext).unwrap();
        let decrypted = encryption.decrypt(&encrypted_data).unwrap();

        assert_eq!(plaintext, decrypted);
        assert_eq!(encrypted_data.algorithm, "AES-256-GCM");
    }

    #[test]
    fn test_encrypt_produces_distinct_ciphertexts() {
        let encryption = setup_test_encryption();

        // 同じ平文でもナンスが異なるため暗号文は毎回変わる
        let first = encryption.encrypt("same_token").unwrap();
        let second = encryption.encrypt("same_token").unwrap();

        assert_ne!(first.ciphertext, second.ciphertext);
        assert_ne!(first.nonce, second.nonce);
    }

    #[test]
    fn test_encrypt_decrypt_token() {
        let encryption = setup_test_encryption();
        let token = "session_token_12345";

        let encrypted_token = encryption.encrypt_token(token).unwrap();
        let decrypted_token = encryption.decrypt_token(&encrypted_token).unwrap();

        assert_eq!(token, decrypted_token);
        assert!(!encrypted_token.is_empty());
        // 暗号化後の文字列に平文トークンが含まれていないことを確認
        assert!(!encrypted_token.contains(token));
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails() {
        let encryption = setup_test_encryption();
        let other = TokenEncryption::new("another_key_entirely_different!!");

        let encrypted_token = encryption.encrypt_token("secret").unwrap();
        let result = other.decrypt_token(&encrypted_token);

        assert!(matches!(result, Err(AppError::Security(_))));
    }

    #[test]
    fn test_invalid_algorithm() {
        let encryption = setup_test_encryption();

        let invalid_data = EncryptedData {
            ciphertext: "test".to_string(),
            nonce: "test".to_string(),
            algorithm: "INVALID".to_string(),
        };

        let result = encryption.decrypt(&invalid_data);
        assert!(result.is_err());
    }

    #[test]
    fn test_short_key_is_padded() {
        // 32バイト未満のキーでも暗号化・復号化が成立する
        let encryption = TokenEncryption::new("short_key");

        let encrypted = encryption.encrypt_token("token").unwrap();
        let decrypted = encryption.decrypt_token(&encrypted).unwrap();

        assert_eq!(decrypted, "token");
    }
}
