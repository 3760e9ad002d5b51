//! Minimal contract ABI codec: selectors, static words and dynamic strings.

use primitive_types::U256;
use sha3::{Digest, Keccak256};
use shared::domain::Address;

use crate::LedgerError;

const WORD: usize = 32;

pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&digest[..4]);
    out
}

enum Token {
    Word([u8; WORD]),
    Bytes(Vec<u8>),
}

pub struct CallEncoder {
    selector: [u8; 4],
    tokens: Vec<Token>,
}

impl CallEncoder {
    pub fn new(signature: &str) -> Self {
        Self {
            selector: selector(signature),
            tokens: Vec::new(),
        }
    }

    pub fn uint(mut self, value: U256) -> Self {
        self.tokens.push(Token::Word(value.to_big_endian()));
        self
    }

    pub fn uint64(self, value: u64) -> Self {
        self.uint(U256::from(value))
    }

    pub fn string(mut self, value: &str) -> Self {
        self.tokens.push(Token::Bytes(value.as_bytes().to_vec()));
        self
    }

    pub fn finish(self) -> Vec<u8> {
        let head_len = self.tokens.len() * WORD;
        let mut head = Vec::with_capacity(head_len);
        let mut tail = Vec::new();

        for token in &self.tokens {
            match token {
                Token::Word(word) => head.extend_from_slice(word),
                Token::Bytes(bytes) => {
                    let offset = U256::from(head_len + tail.len());
                    head.extend_from_slice(&offset.to_big_endian());
                    tail.extend_from_slice(&U256::from(bytes.len()).to_big_endian());
                    tail.extend_from_slice(bytes);
                    let padding = (WORD - bytes.len() % WORD) % WORD;
                    tail.resize(tail.len() + padding, 0);
                }
            }
        }

        let mut out = Vec::with_capacity(4 + head.len() + tail.len());
        out.extend_from_slice(&self.selector);
        out.extend_from_slice(&head);
        out.extend_from_slice(&tail);
        out
    }
}

pub struct ReturnDecoder<'a> {
    data: &'a [u8],
}

impl<'a> ReturnDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn word_at(&self, offset: usize) -> Result<&'a [u8], LedgerError> {
        self.data
            .get(offset..offset + WORD)
            .ok_or_else(|| LedgerError::Decode(format!("return data too short for word at {offset}")))
    }

    fn word(&self, index: usize) -> Result<&'a [u8], LedgerError> {
        self.word_at(index * WORD)
    }

    pub fn uint(&self, index: usize) -> Result<U256, LedgerError> {
        Ok(U256::from_big_endian(self.word(index)?))
    }

    pub fn uint64(&self, index: usize) -> Result<u64, LedgerError> {
        let value = self.uint(index)?;
        if value > U256::from(u64::MAX) {
            return Err(LedgerError::Decode(format!(
                "value {value} at position {index} exceeds 64 bits"
            )));
        }
        Ok(value.low_u64())
    }

    pub fn bool(&self, index: usize) -> Result<bool, LedgerError> {
        match self.uint(index)? {
            v if v.is_zero() => Ok(false),
            v if v == U256::one() => Ok(true),
            v => Err(LedgerError::Decode(format!(
                "invalid bool {v} at position {index}"
            ))),
        }
    }

    pub fn address(&self, index: usize) -> Result<Address, LedgerError> {
        let word = self.word(index)?;
        if word[..12].iter().any(|b| *b != 0) {
            return Err(LedgerError::Decode(format!(
                "dirty address padding at position {index}"
            )));
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&word[12..]);
        Ok(Address(bytes))
    }

    pub fn string(&self, index: usize) -> Result<String, LedgerError> {
        let offset = self.offset(self.uint(index)?)?;
        let len = self.offset(U256::from_big_endian(self.word_at(offset)?))?;
        let start = offset + WORD;
        let bytes = start
            .checked_add(len)
            .and_then(|end| self.data.get(start..end))
            .ok_or_else(|| LedgerError::Decode(format!("string at position {index} overruns data")))?;
        String::from_utf8(bytes.to_vec())
            .map_err(|err| LedgerError::Decode(format!("string at position {index}: {err}")))
    }

    fn offset(&self, value: U256) -> Result<usize, LedgerError> {
        if value > U256::from(self.data.len()) {
            return Err(LedgerError::Decode(format!(
                "offset {value} beyond {} bytes of return data",
                self.data.len()
            )));
        }
        Ok(value.low_u64() as usize)
    }
}
