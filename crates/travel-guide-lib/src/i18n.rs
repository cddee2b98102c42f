//! User-facing strings in English and Russian

use crate::guide::Category;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Interface language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    #[default]
    Ru,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ru => "ru",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Language::En => Language::Ru,
            Language::Ru => Language::En,
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Language::En),
            "ru" => Ok(Language::Ru),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

/// Translation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    AppTitle,
    Loading,
    ErrorTitle,
    ErrorDescription,
    ErrorRetry,
    EmptyTitle,
    EmptyDescription,
    BackToCountries,
    Premium,
    WhatToVisit,
    OpenOnMaps,
    Comment,
    MapLoading,
    RouteLength,
    AdminPanel,
    ExitAdmin,
    ManageCountries,
    ManageCities,
    ManagePlaces,
    Export,
    Import,
    SelectCountry,
    SelectCity,
    SelectCategory,
    NoCategory,
    NoCountries,
    NoCities,
    ExportSuccess,
    ImportSuccess,
    ImportError,
    AddSuccess,
    UpdateSuccess,
    DeleteSuccess,
    RequiredFields,
    InvalidCoordinates,
}

/// Look up a translated string
pub fn t(key: Key, language: Language) -> &'static str {
    match language {
        Language::En => english(key),
        Language::Ru => russian(key),
    }
}

fn english(key: Key) -> &'static str {
    match key {
        Key::AppTitle => "What to See?",
        Key::Loading => "Loading stuff...",
        Key::ErrorTitle => "Failed to load guides",
        Key::ErrorDescription => "Something went wrong...",
        Key::ErrorRetry => "Try Again",
        Key::EmptyTitle => "Nothing here yet",
        Key::EmptyDescription => "Check back later",
        Key::BackToCountries => "Back to countries",
        Key::Premium => "For selected ones",
        Key::WhatToVisit => "What to visit in the city?",
        Key::OpenOnMaps => "Open on maps",
        Key::Comment => "Comment",
        Key::MapLoading => "Loading map...",
        Key::RouteLength => "Route length",
        Key::AdminPanel => "Admin Panel",
        Key::ExitAdmin => "Exit Admin",
        Key::ManageCountries => "Manage Countries",
        Key::ManageCities => "Manage Cities",
        Key::ManagePlaces => "Manage Places",
        Key::Export => "Export JSON",
        Key::Import => "Import JSON",
        Key::SelectCountry => "Select Country",
        Key::SelectCity => "Select City",
        Key::SelectCategory => "Select Category",
        Key::NoCategory => "No category",
        Key::NoCountries => "No countries available. Create a country first.",
        Key::NoCities => "No cities in this country. Create a city first.",
        Key::ExportSuccess => "JSON file downloaded successfully!",
        Key::ImportSuccess => "JSON file imported successfully!",
        Key::ImportError => "Invalid JSON file!",
        Key::AddSuccess => "Added successfully!",
        Key::UpdateSuccess => "Updated successfully!",
        Key::DeleteSuccess => "Deleted successfully!",
        Key::RequiredFields => "Please fill all required fields",
        Key::InvalidCoordinates => "Coordinates are out of range",
    }
}

fn russian(key: Key) -> &'static str {
    match key {
        Key::AppTitle => "Че поглядеть?",
        Key::Loading => "Загружаем штуки...",
        Key::ErrorTitle => "Не смог загрузить гайды",
        Key::ErrorDescription => "Кажется, что-то пошло не так...",
        Key::ErrorRetry => "Попробовать снова",
        Key::EmptyTitle => "Пока ничего нет",
        Key::EmptyDescription => "Зайдите позже",
        Key::BackToCountries => "Назад к странам",
        Key::Premium => "Для избранных",
        Key::WhatToVisit => "Че посетить в городе?",
        Key::OpenOnMaps => "Открыть на картах",
        Key::Comment => "Коммент",
        Key::MapLoading => "Загружаем карту...",
        Key::RouteLength => "Длина маршрута",
        Key::AdminPanel => "Админ-панель",
        Key::ExitAdmin => "Выйти из админки",
        Key::ManageCountries => "Управление странами",
        Key::ManageCities => "Управление городами",
        Key::ManagePlaces => "Управление местами",
        Key::Export => "Экспорт JSON",
        Key::Import => "Импорт JSON",
        Key::SelectCountry => "Выберите страну",
        Key::SelectCity => "Выберите город",
        Key::SelectCategory => "Выберите категорию",
        Key::NoCategory => "Без категории",
        Key::NoCountries => "Нет доступных стран. Сначала создайте страну.",
        Key::NoCities => "В этой стране нет городов. Сначала создайте город.",
        Key::ExportSuccess => "JSON файл успешно скачан!",
        Key::ImportSuccess => "JSON файл успешно импортирован!",
        Key::ImportError => "Неверный JSON файл!",
        Key::AddSuccess => "Успешно добавлено!",
        Key::UpdateSuccess => "Успешно обновлено!",
        Key::DeleteSuccess => "Успешно удалено!",
        Key::RequiredFields => "Заполните все обязательные поля",
        Key::InvalidCoordinates => "Координаты вне допустимого диапазона",
    }
}

/// Human-readable category tag shown in place popups and tabs
pub fn category_label(category: Category, language: Language) -> Option<&'static str> {
    let label = match (category, language) {
        (Category::Sightseeing, Language::En) => "Sightseeing",
        (Category::Food, Language::En) => "Eat Food",
        (Category::Coffee, Language::En) => "Drink Coffee",
        (Category::Sightseeing, Language::Ru) => "Поглядеть",
        (Category::Food, Language::Ru) => "Поесть еду",
        (Category::Coffee, Language::Ru) => "Попить кофе",
        (Category::Unlabeled, _) => return None,
    };
    Some(label)
}

/// Plural form of a count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluralForm {
    One,
    Few,
    Many,
}

/// Russian plural rule: 11-19 take "many", then the last digit decides
pub fn russian_plural(count: usize) -> PluralForm {
    let last_digit = count % 10;
    let last_two_digits = count % 100;

    if (11..=19).contains(&last_two_digits) {
        PluralForm::Many
    } else if last_digit == 1 {
        PluralForm::One
    } else if (2..=4).contains(&last_digit) {
        PluralForm::Few
    } else {
        PluralForm::Many
    }
}

/// Label such as "3 cities" / "3 города" for a country card
pub fn city_count_label(count: usize, language: Language) -> String {
    let word = match language {
        Language::En if count == 1 => "city",
        Language::En => "cities",
        Language::Ru => match russian_plural(count) {
            PluralForm::One => "город",
            PluralForm::Few => "города",
            PluralForm::Many => "городов",
        },
    };
    format!("{count} {word}")
}
