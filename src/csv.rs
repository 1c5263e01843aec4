use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::Amount;
use crate::model::{Card, Channel, Command, Denomination, Instrument, SlotId};

/// Errors that can occur when parsing event script rows
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to open script: {0}")]
    Open(#[source] csv::Error),

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized action '{action}'")]
    UnrecognizedAction { line: usize, action: String },

    #[error("line {line}: {action} missing {field}")]
    MissingField {
        line: usize,
        action: String,
        field: &'static str,
    },

    #[error("line {line}: {reason}")]
    Invalid { line: usize, reason: String },
}

#[derive(Debug, Deserialize)]
struct InputRow {
    action: String,
    slot: Option<usize>,
    /// Channel the instrument is presented to
    channel: Option<Channel>,
    /// Kind of instrument, defaults to the channel
    kind: Option<Channel>,
    amount: Option<Amount>,
    count: Option<u32>,
}

#[derive(Debug, Serialize)]
struct OutputRow {
    channel: Channel,
    worth: Amount,
    count: u32,
}

/// Read machine commands from a csv event script
pub fn read_commands(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<Command, ScriptError>>, ScriptError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(ScriptError::Open)?;

    Ok(reader
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| ScriptError::Parse { line, source })?;
            parse_row(line, row)
        }))
}

fn parse_row(line: usize, row: InputRow) -> Result<Command, ScriptError> {
    let missing = |field: &'static str| ScriptError::MissingField {
        line,
        action: row.action.clone(),
        field,
    };

    match row.action.as_str() {
        "confirm" => Ok(Command::Confirm),
        "select" => {
            let slot = row.slot.ok_or_else(|| missing("slot"))?;
            Ok(Command::Select(SlotId(slot)))
        }
        "insert" => {
            let channel = row.channel.ok_or_else(|| missing("channel"))?;
            let amount = row.amount.ok_or_else(|| missing("amount"))?;
            let instrument = match row.kind.unwrap_or(channel) {
                Channel::Coin => Instrument::Coin(amount),
                Channel::Note => Instrument::Note(amount),
                Channel::Card => Instrument::Card(Card::new(format!("script-{line}"), "script", amount)),
            };
            Ok(Command::Insert {
                channel,
                instrument,
            })
        }
        "dispense" => Ok(Command::Dispense),
        "cancel" => Ok(Command::Cancel),
        "reset" => Ok(Command::Reset),
        "restock" => {
            let slot = row.slot.ok_or_else(|| missing("slot"))?;
            let quantity = row.count.ok_or_else(|| missing("count"))?;
            Ok(Command::Restock {
                slot: SlotId(slot),
                quantity,
            })
        }
        "float" => {
            let channel = row.channel.ok_or_else(|| missing("channel"))?;
            let worth = row.amount.ok_or_else(|| missing("amount"))?;
            let count = row.count.ok_or_else(|| missing("count"))?;
            let denomination = match channel {
                Channel::Coin => Denomination::Coin(worth),
                Channel::Note => Denomination::Note(worth),
                Channel::Card => {
                    return Err(ScriptError::Invalid {
                        line,
                        reason: "float cannot hold card payments".to_string(),
                    });
                }
            };
            Ok(Command::Float {
                denomination,
                count,
            })
        }
        "service_on" => Ok(Command::SetInService(true)),
        "service_off" => Ok(Command::SetInService(false)),
        other => Err(ScriptError::UnrecognizedAction {
            line,
            action: other.to_string(),
        }),
    }
}

/// Write ledger stock in csv format
pub fn write_ledger(
    writer: impl io::Write,
    stock: impl IntoIterator<Item = (Denomination, u32)>,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);

    for (denomination, count) in stock {
        writer.serialize(OutputRow {
            channel: denomination.channel(),
            worth: denomination.worth(),
            count,
        })?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "action,slot,channel,kind,amount,count\n";

    fn write_csv(rows: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(HEADER.as_bytes()).unwrap();
        file.write_all(rows.as_bytes()).unwrap();
        file
    }

    fn read(rows: &str) -> Vec<Result<Command, ScriptError>> {
        let file = write_csv(rows);
        read_commands(file.path()).unwrap().collect()
    }

    #[test]
    fn read_purchase() {
        let results = read("confirm,,,,,\nselect,1,,,,\ninsert,,coin,,0.25,\ndispense,,,,,\n");
        let commands: Vec<_> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(
            commands,
            vec![
                Command::Confirm,
                Command::Select(SlotId(1)),
                Command::Insert {
                    channel: Channel::Coin,
                    instrument: Instrument::Coin(Amount::from_cents(25)),
                },
                Command::Dispense,
            ]
        );
    }

    #[test]
    fn read_mismatched_instrument() {
        let results = read("insert,,coin,note,20,\n");
        let command = results.into_iter().next().unwrap().unwrap();
        assert_eq!(
            command,
            Command::Insert {
                channel: Channel::Coin,
                instrument: Instrument::Note(Amount::from_units(20)),
            }
        );
    }

    #[test]
    fn read_card() {
        let results = read("insert,,card,,2.50,\n");
        match results.into_iter().next().unwrap().unwrap() {
            Command::Insert {
                channel: Channel::Card,
                instrument: Instrument::Card(card),
            } => assert_eq!(card.worth, Amount::from_cents(250)),
            other => panic!("expected card insert, got {other:?}"),
        }
    }

    #[test]
    fn read_operator_actions() {
        let results = read("restock,2,,,,4\nfloat,,note,,20,3\nservice_off,,,,,\nservice_on,,,,,\nreset,,,,,\ncancel,,,,,\n");
        let commands: Vec<_> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(
            commands,
            vec![
                Command::Restock {
                    slot: SlotId(2),
                    quantity: 4,
                },
                Command::Float {
                    denomination: Denomination::Note(Amount::from_units(20)),
                    count: 3,
                },
                Command::SetInService(false),
                Command::SetInService(true),
                Command::Reset,
                Command::Cancel,
            ]
        );
    }

    #[test]
    fn read_with_whitespace() {
        let results = read("insert, , coin, , 1.00, \n");
        assert_eq!(results.len(), 1);
        assert!(results[0].is_ok());
    }

    #[test]
    fn read_returns_error_for_unknown_action() {
        let results = read("explode,,,,,\n");
        let err = results[0].as_ref().unwrap_err();
        assert!(matches!(err, ScriptError::UnrecognizedAction { line: 2, .. }));
    }

    #[test]
    fn read_returns_error_for_missing_field() {
        let results = read("confirm,,,,,\ninsert,,coin,,,\n");
        let err = results[1].as_ref().unwrap_err();
        assert!(matches!(
            err,
            ScriptError::MissingField {
                line: 3,
                field: "amount",
                ..
            }
        ));
    }

    #[test]
    fn read_returns_error_for_bad_amount() {
        let results = read("insert,,coin,,ten,\n");
        let err = results[0].as_ref().unwrap_err();
        assert!(matches!(err, ScriptError::Parse { line: 2, .. }));
    }

    #[test]
    fn read_rejects_card_float() {
        let results = read("float,,card,,1,1\n");
        assert!(matches!(
            results[0].as_ref().unwrap_err(),
            ScriptError::Invalid { line: 2, .. }
        ));
    }

    #[test]
    fn missing_file_fails_to_open() {
        let result = read_commands("/nonexistent/script.csv");
        assert!(matches!(result, Err(ScriptError::Open(_))));
    }

    #[test]
    fn write_ledger_rows() {
        let mut out = Vec::new();
        write_ledger(
            &mut out,
            vec![
                (Denomination::Note(Amount::from_units(50)), 1),
                (Denomination::Coin(Amount::from_cents(10)), 20),
            ],
        )
        .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "channel,worth,count\nnote,50.00,1\ncoin,0.10,20\n"
        );
    }
}
