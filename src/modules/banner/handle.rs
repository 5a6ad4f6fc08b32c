use actix_multipart::Multipart;
use actix_web::{delete, get, post, put, web};
use futures_util::TryStreamExt;

use crate::{
    api::{
        error,
        success::{self, Page},
    },
    modules::{
        banner::{
            model::{BannerData, BannerQuery, BannerResponse},
            service::BannerService,
        },
        file_manager::UploadedImage,
    },
    utils::ValidatedQuery,
};

/// `image[en]` -> `en`
fn image_language(field_name: &str) -> Option<&str> {
    field_name
        .strip_prefix("image[")
        .and_then(|rest| rest.strip_suffix(']'))
        .filter(|language| !language.is_empty())
}

/// Read the `data` JSON field and the `image[<language>]` file fields.
async fn read_submission(mut payload: Multipart) -> Result<BannerData, error::Error> {
    let mut data = BannerData::default();

    while let Some(mut field) =
        payload.try_next().await.map_err(|e| error::Error::bad_request(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();
        let mime_type = field
            .content_type()
            .map(|m| m.essence_str().to_string())
            .filter(|m| m != "application/octet-stream");

        // Read field bytes
        let mut bytes = Vec::new();
        while let Some(chunk) =
            field.try_next().await.map_err(|e| error::Error::bad_request(e.to_string()))?
        {
            bytes.extend_from_slice(&chunk);
        }

        if name == "data" {
            data.fields = serde_json::from_slice(&bytes)
                .map_err(|e| error::Error::bad_request(format!("Invalid banner data: {e}")))?;
            continue;
        }

        let Some(language) = image_language(&name) else {
            return Err(error::Error::bad_request(format!("Unexpected field '{name}'")));
        };

        // An empty file input means no upload for this language.
        if bytes.is_empty() {
            continue;
        }

        let mut image = UploadedImage::new(filename, bytes);
        if let Some(mime_type) = mime_type {
            image = image.with_mime_type(mime_type);
        }
        data.images.insert(language.to_string(), image);
    }

    Ok(data)
}

fn current_model(service: &BannerService) -> Result<BannerResponse, error::Error> {
    let banner = service.model().cloned().ok_or_else(error::Error::internal_server_error)?;
    Ok(BannerResponse::from_model(banner, service.file_manager()))
}

#[get("/")]
pub async fn list_banners(
    banner_service: web::Data<BannerService>,
    query: ValidatedQuery<BannerQuery>,
) -> Result<success::Success<Page<BannerResponse>>, error::Error> {
    let query = query.0;
    let page = banner_service
        .get_data_provider()
        .paginate(query.pagination())
        .sort_by(query.sort()?)
        .fetch()
        .await?;

    let files = banner_service.file_manager();
    let page = page.map(|banner| BannerResponse::from_model(banner, files));
    Ok(success::Success::ok(Some(page)).message("Banners retrieved successfully"))
}

#[get("/new")]
pub async fn new_banner(
    banner_service: web::Data<BannerService>,
) -> Result<success::Success<BannerResponse>, error::Error> {
    let mut service = banner_service.get_ref().clone();
    service.get_model(None).await?;
    Ok(success::Success::ok(Some(current_model(&service)?)))
}

#[get("/{id:\\d+}")]
pub async fn get_banner(
    banner_service: web::Data<BannerService>,
    id: web::Path<i64>,
) -> Result<success::Success<BannerResponse>, error::Error> {
    let mut service = banner_service.get_ref().clone();
    service.get_model(Some(id.into_inner())).await?;
    Ok(success::Success::ok(Some(current_model(&service)?))
        .message("Banner retrieved successfully"))
}

#[post("/")]
pub async fn create_banner(
    banner_service: web::Data<BannerService>,
    payload: Multipart,
) -> Result<success::Success<BannerResponse>, error::Error> {
    let data = read_submission(payload).await?;

    let mut service = banner_service.get_ref().clone();
    service.get_model(None).await?;
    service.try_save(data).await?;

    Ok(success::Success::created(Some(current_model(&service)?))
        .message("Banner created successfully"))
}

#[put("/{id:\\d+}")]
pub async fn update_banner(
    banner_service: web::Data<BannerService>,
    id: web::Path<i64>,
    payload: Multipart,
) -> Result<success::Success<BannerResponse>, error::Error> {
    let mut service = banner_service.get_ref().clone();
    service.get_model(Some(id.into_inner())).await?;

    let data = read_submission(payload).await?;
    service.try_save(data).await?;

    Ok(success::Success::ok(Some(current_model(&service)?))
        .message("Banner updated successfully"))
}

#[delete("/{id:\\d+}")]
pub async fn delete_banner(
    banner_service: web::Data<BannerService>,
    id: web::Path<i64>,
) -> Result<success::Success<()>, error::Error> {
    if banner_service.delete(id.into_inner()).await? {
        Ok(success::Success::no_content())
    } else {
        Err(error::Error::internal_server_error())
    }
}
