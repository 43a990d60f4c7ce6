//! Networked backend tests
//!
//! Run with: DATABASE_URL=postgres://... cargo test -p picoles-db -- --ignored
//! These recreate every table in the target database.

use picoles_db::{
    Backend, Database, DatabaseConfig, DbError, ForeignKeyDetail, NewAditivoNutritivo,
    NewConservante, NewConservantePicole, NewPicole,
};

async fn networked_db() -> Database {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let db = Database::new(DatabaseConfig::networked_at(url));
    db.create_tables().await.expect("create tables");
    db
}

#[tokio::test]
#[ignore = "requires database"]
async fn networked_crud_round() {
    let db = networked_db().await;
    assert_eq!(db.session().await.unwrap().backend(), Backend::Networked);

    let aditivo = db
        .aditivos_nutritivos()
        .insert(NewAditivoNutritivo::new(" Vitamina C", "c6h8o6 "))
        .await
        .unwrap();
    assert_eq!(aditivo.nome, "VITAMINA C");
    assert_eq!(aditivo.data_criacao, aditivo.data_atualizacao);

    let err = db
        .aditivos_nutritivos()
        .insert(NewAditivoNutritivo::new("Vitamina C", "H2O"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::UniquenessViolation { field: "nome", .. }));

    db.close().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn networked_foreign_keys() {
    let db = networked_db().await;

    let picole = db.picoles().insert(NewPicole::new("Morango", 3.5)).await.unwrap();
    let conservante = db
        .conservantes()
        .insert(NewConservante::new("Sorbato", "Conservante"))
        .await
        .unwrap();

    let link = NewConservantePicole {
        picole_fk: picole.id,
        conservante_fk: conservante.id,
    };
    db.conservantes_picoles().insert(link).await.unwrap();

    let err = db.conservantes_picoles().insert(link).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::UniquenessViolation {
            field: "conservante_picole",
            ..
        }
    ));

    let err = db
        .conservantes_picoles()
        .insert(NewConservantePicole {
            picole_fk: picole.id + 100,
            conservante_fk: conservante.id,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::ForeignKeyViolation {
            detail: ForeignKeyDetail::MissingReference { .. },
            ..
        }
    ));

    let err = db.picoles().delete(picole.id).await.unwrap_err();
    match err {
        DbError::ForeignKeyViolation {
            detail: ForeignKeyDetail::Referenced { tables, .. },
            ..
        } => assert_eq!(tables, vec!["aditivo_nutritivo_picole", "conservante_picole"]),
        other => panic!("expected referenced violation, got {:?}", other),
    }

    db.close().await;
}
